use super::PALETTE;
use crate::analytics::correlation::CorrelationMatrix;
use crate::analytics::cumulative::SeriesLine;
use crate::analytics::monthly::{MonthlyMovers, MonthKey};
use crate::analytics::sector::{ReturnBucket, SectorReturn};
use crate::analytics::ranking::VolatilityEntry;
use crate::app_state::App;
use crate::dashboard::TabView;
use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, List,
        ListItem, Paragraph, Row, Table,
    },
    Frame,
};

/// 柱状图只接受 u64，百分比放大 100 倍后取绝对值，标签里保留符号
fn bar_height(pct: f64) -> u64 {
    (pct.abs() * 100.0).round() as u64
}

fn bar_width(area: Rect, n: usize) -> u16 {
    if n == 0 {
        return 1;
    }
    let inner = area.width.saturating_sub(2) as usize;
    ((inner / n).saturating_sub(1)).clamp(1, 12) as u16
}

fn truncate(s: &str, width: u16) -> String {
    s.chars().take(width as usize).collect()
}

pub(super) fn render_tab_body(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(view) = app.view.as_ref() else {
        return;
    };

    match &view.tab {
        TabView::Sectors(rows) => render_sectors(f, area, rows),
        TabView::Volatility(rows) => render_volatility(f, area, rows),
        TabView::Cumulative { top, selected, .. } => {
            let (top, selected) = (top.clone(), selected.clone());
            let cols = split_picker(area);
            render_picker(f, cols[0], app);
            if selected.is_empty() {
                render_series(f, cols[1], "累计收益 Top 5", &top);
            } else {
                let rows = Layout::default()
                    .direction(ratatui::layout::Direction::Vertical)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(cols[1]);
                render_series(f, rows[0], "累计收益 Top 5", &top);
                render_series(f, rows[1], "累计收益 (已选)", &selected);
            }
        }
        TabView::Correlation { full, selected, .. } => {
            let (full, selected) = (full.clone(), selected.clone());
            let cols = split_picker(area);
            render_picker(f, cols[0], app);
            match (full, selected) {
                (None, None) => {
                    let hint = Paragraph::new(vec![
                        Line::from("按 t 显示全部股票的相关性热力图"),
                        Line::from("在左侧用空格选择股票，查看所选股票之间的相关性"),
                    ])
                    .block(Block::default().borders(Borders::ALL).title("相关性"));
                    f.render_widget(hint, cols[1]);
                }
                (Some(m), None) => render_heatmap(f, cols[1], "全部股票相关性", &m),
                (None, Some(m)) => render_heatmap(f, cols[1], "所选股票相关性", &m),
                (Some(all), Some(sel)) => {
                    let rows = Layout::default()
                        .direction(ratatui::layout::Direction::Vertical)
                        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .split(cols[1]);
                    render_heatmap(f, rows[0], "全部股票相关性", &all);
                    render_heatmap(f, rows[1], "所选股票相关性", &sel);
                }
            }
        }
        TabView::Movers { months, movers } => render_movers(f, area, months, movers.as_ref()),
    }
}

fn split_picker(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(0)])
        .split(area)
}

fn render_picker(f: &mut Frame, area: Rect, app: &mut App) {
    let selection = app.filters.selection().cloned().unwrap_or_default();
    let items: Vec<ListItem> = app
        .picker_symbols()
        .iter()
        .map(|symbol| {
            let picked = selection.iter().any(|s| s == symbol);
            let (mark, style) = if picked {
                ("[x] ", Style::default().fg(Color::Green))
            } else {
                ("[ ] ", Style::default().fg(Color::White))
            };
            ListItem::new(format!("{}{}", mark, symbol)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("选择 ({})", selection.len())),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    f.render_stateful_widget(list, area, &mut app.picker_state);
}

fn render_sectors(f: &mut Frame, area: Rect, rows: &[SectorReturn]) {
    let width = bar_width(area, rows.len());
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            let color = match r.bucket {
                ReturnBucket::Gain => Color::Green,
                ReturnBucket::Loss => Color::Red,
            };
            Bar::default()
                .value(bar_height(r.avg_yearly_return))
                .text_value(format!("{:.2}%", r.avg_yearly_return))
                .label(Line::from(truncate(&r.sector, width)))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("板块平均年收益率 (%)"),
        )
        .bar_width(width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

fn render_volatility(f: &mut Frame, area: Rect, rows: &[VolatilityEntry]) {
    let width = bar_width(area, rows.len());
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            Bar::default()
                .value(bar_height(r.volatility_pct))
                .text_value(format!("{:.2}%", r.volatility_pct))
                .label(Line::from(truncate(&r.symbol, width)))
                .style(Style::default().fg(Color::Yellow))
                .value_style(Style::default().fg(Color::Black).bg(Color::Yellow))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("波动率最高的 10 只股票 (%)"),
        )
        .bar_width(width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

fn render_series(f: &mut Frame, area: Rect, title: &str, lines: &[SeriesLine]) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if lines.iter().all(|l| l.points.is_empty()) {
        f.render_widget(Paragraph::new("暂无数据").block(block), area);
        return;
    }

    // 横轴用 CE 以来的天数
    let points: Vec<Vec<(f64, f64)>> = lines
        .iter()
        .map(|l| {
            l.points
                .iter()
                .map(|(d, v)| (d.num_days_from_ce() as f64, *v))
                .collect()
        })
        .collect();

    let all = points.iter().flatten();
    let (mut x_min, mut x_max) = (f64::MAX, f64::MIN);
    let (mut y_min, mut y_max) = (f64::MAX, f64::MIN);
    for (x, y) in all {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    if y_min == y_max {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let first_date = lines.iter().filter_map(|l| l.points.first()).map(|p| p.0).min();
    let last_date = lines.iter().filter_map(|l| l.points.last()).map(|p| p.0).max();

    let datasets: Vec<Dataset> = lines
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (line, pts))| {
            Dataset::default()
                .name(line.symbol.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(pts)
        })
        .collect();

    let x_labels = vec![
        Span::raw(first_date.map(|d| d.to_string()).unwrap_or_default()),
        Span::raw(last_date.map(|d| d.to_string()).unwrap_or_default()),
    ];
    let y_labels = vec![
        Span::raw(format!("{:.2}", y_min)),
        Span::raw(format!("{:.2}", (y_min + y_max) / 2.0)),
        Span::raw(format!("{:.2}", y_max)),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("日期")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("累计收益")
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );
    f.render_widget(chart, area);
}

/// 红 = 正相关，蓝 = 负相关，越接近 0 越白
fn heat_color(v: f64) -> Color {
    let v = v.clamp(-1.0, 1.0);
    let fade = (255.0 * (1.0 - v.abs())) as u8;
    if v >= 0.0 {
        Color::Rgb(255, fade, fade)
    } else {
        Color::Rgb(fade, fade, 255)
    }
}

fn render_heatmap(f: &mut Frame, area: Rect, title: &str, m: &CorrelationMatrix) {
    let title = format!("{} (有效日期 {} 天)", title, m.observations);
    let block = Block::default().borders(Borders::ALL).title(title);
    if m.is_empty() {
        f.render_widget(Paragraph::new("暂无数据").block(block), area);
        return;
    }

    let mut header = vec![Cell::from("")];
    header.extend(m.symbols.iter().map(|s| Cell::from(truncate(s, 6))));

    let rows: Vec<Row> = m
        .symbols
        .iter()
        .zip(m.values.iter())
        .map(|(symbol, values)| {
            let mut cells = vec![Cell::from(symbol.clone())
                .style(Style::default().add_modifier(Modifier::BOLD))];
            cells.extend(values.iter().map(|v| match v {
                Some(v) => Cell::from(format!("{:>5.2}", v))
                    .style(Style::default().fg(Color::Black).bg(heat_color(*v))),
                None => Cell::from("  —").style(Style::default().fg(Color::DarkGray)),
            }));
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(11)];
    widths.extend(std::iter::repeat(Constraint::Length(6)).take(m.symbols.len()));

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .column_spacing(1)
        .block(block);
    f.render_widget(table, area);
}

fn render_movers(f: &mut Frame, area: Rect, months: &[MonthKey], movers: Option<&MonthlyMovers>) {
    let rows = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let Some(movers) = movers else {
        let p = Paragraph::new("暂无月度数据")
            .block(Block::default().borders(Borders::ALL).title("月度涨跌榜"));
        f.render_widget(p, area);
        return;
    };

    let pos = months.iter().position(|m| *m == movers.month).unwrap_or(0);
    let picker = Line::from(vec![
        Span::styled(
            if pos > 0 { "◀ " } else { "  " },
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            movers.month.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            if pos + 1 < months.len() { " ▶" } else { "  " },
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("   ({}/{}，←→ 切换月份)", pos + 1, months.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(
        Paragraph::new(picker)
            .block(Block::default().borders(Borders::ALL).title("选择月份"))
            .alignment(ratatui::layout::Alignment::Center),
        rows[0],
    );

    let cols = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_monthly_bars(
        f,
        cols[0],
        &format!("涨幅前 5 ({})", movers.month),
        movers.gainers.iter().map(|r| (r.symbol.as_str(), r.monthly_return)),
        Color::Green,
    );
    render_monthly_bars(
        f,
        cols[1],
        &format!("跌幅前 5 ({})", movers.month),
        movers.losers.iter().map(|r| (r.symbol.as_str(), r.monthly_return)),
        Color::Red,
    );
}

fn render_monthly_bars<'a>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: impl Iterator<Item = (&'a str, f64)>,
    color: Color,
) {
    let rows: Vec<(&str, f64)> = rows.collect();
    let width = bar_width(area, rows.len());
    let bars: Vec<Bar> = rows
        .iter()
        .map(|(symbol, ret)| {
            Bar::default()
                .value(bar_height(*ret))
                .text_value(format!("{:.2}%", ret))
                .label(Line::from(truncate(symbol, width)))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .bar_width(width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}
