mod charts;

use crate::analytics::ranking::RankedStock;
use crate::analytics::summary::{format_price, format_volume};
use crate::app_state::{App, InputMode};
use crate::dashboard::{HeaderView, Tab};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

/// 树图的配色，按 sector 顺序循环使用
pub(crate) const PALETTE: [Color; 8] = [
    Color::LightRed,
    Color::LightBlue,
    Color::LightGreen,
    Color::Magenta,
    Color::Yellow,
    Color::Cyan,
    Color::LightMagenta,
    Color::White,
];

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // 顶部标题栏
            Constraint::Length(14), // 板块分布 + 市场概览
            Constraint::Length(3),  // 分析页签
            Constraint::Min(12),    // 当前页签内容
            Constraint::Length(8),  // 底部命令/日志区域
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    if let Some(ref msg) = app.fatal {
        let area = Rect {
            height: chunks[1].height + chunks[2].height + chunks[3].height,
            ..chunks[1]
        };
        render_fatal(f, area, msg);
    } else if let Some(view) = app.view.as_ref() {
        render_header(f, chunks[1], &view.header);
        render_tabs(f, chunks[2], app.filters.tab);
        charts::render_tab_body(f, chunks[3], app);
    } else {
        let area = Rect {
            height: chunks[1].height + chunks[2].height + chunks[3].height,
            ..chunks[1]
        };
        let paragraph = Paragraph::new("正在加载数据...")
            .block(Block::default().borders(Borders::ALL))
            .alignment(ratatui::layout::Alignment::Center);
        f.render_widget(paragraph, area);
    }

    render_bottom_bar(f, chunks[4], app);
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let title = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));

    let status = if app.loading {
        Span::styled("  加载中...", Style::default().fg(Color::Yellow))
    } else if let Some(ref snap) = app.snapshot {
        Span::styled(
            format!("  数据时间 {}", snap.loaded_at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::raw("")
    };

    let title_text = Line::from(vec![
        Span::styled(
            " NIFTY 50 股票分析 ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - Terminal Dashboard"),
        status,
    ]);

    let paragraph = Paragraph::new(title_text)
        .block(title)
        .alignment(ratatui::layout::Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_fatal(f: &mut Frame, area: Rect, msg: &str) {
    let lines = vec![
        Line::from(Span::styled(
            "✗ 数据加载失败",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(msg.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "按 r 重新加载, q 退出",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("错误")
                .style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_header(f: &mut Frame, area: Rect, header: &HeaderView) {
    let cols = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(18),
            Constraint::Percentage(24),
            Constraint::Percentage(24),
        ])
        .split(area);

    // 板块分布：sector -> company
    let mut lines: Vec<Line> = Vec::new();
    for (i, node) in header.sectors.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ({}) ", node.sector, node.companies.len()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(node.companies.join(", "), Style::default().fg(Color::Gray)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from("暂无数据"));
    }
    let tree = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("板块分布"))
        .wrap(Wrap { trim: true });
    f.render_widget(tree, cols[0]);

    let s = &header.summary;
    let metrics = vec![
        Line::from(vec![
            Span::raw("上涨股票 "),
            Span::styled(
                format!("{:>6}", s.green),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("下跌股票 "),
            Span::styled(
                format!("{:>6}", s.red),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("平均价格", Style::default().fg(Color::Blue))),
        Line::from(format!("  {}", format_price(s.avg_price))),
        Line::from(Span::styled("平均成交量", Style::default().fg(Color::Magenta))),
        Line::from(format!("  {}", format_volume(s.avg_volume))),
    ];
    let metrics = Paragraph::new(metrics).block(
        Block::default()
            .borders(Borders::ALL)
            .title("市场概览")
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(metrics, cols[1]);

    f.render_widget(ranked_table("涨幅榜 Top 10", &header.gainers, Color::Green), cols[2]);
    f.render_widget(ranked_table("跌幅榜 Top 10", &header.losers, Color::Red), cols[3]);
}

fn ranked_table<'a>(title: &'a str, rows: &[RankedStock], color: Color) -> Table<'a> {
    let body: Vec<Row> = rows
        .iter()
        .map(|r| {
            Row::new(vec![
                r.symbol.clone(),
                format!("{:.2}", r.avg_price),
                format!("{:.2}", r.yearly_return),
            ])
            .style(Style::default().fg(color))
        })
        .collect();

    Table::new(
        body,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ],
    )
    .header(
        Row::new(vec!["Symbol", "价格(₹)", "年收益%"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title))
}

fn render_tabs(f: &mut Frame, area: Rect, current: Tab) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("股票分析"))
        .select(current.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let command_prompt = if app.input_mode == InputMode::Command {
        let mut spans = vec![Span::styled(
            "命令: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];
        let cur = app.command_cursor.min(app.command_input.len());
        let (left, right) = app.command_input.split_at(cur);
        spans.push(Span::raw(left));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(right));

        if let Some(hint) = app.get_completion_hint() {
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        }
        Line::from(spans)
    } else {
        Line::from(vec![
            Span::styled("按键: ", Style::default().fg(Color::Yellow)),
            Span::raw(
                "Tab/1-5 切换页签 ↑↓ 移动 空格 选择 c 清空 t 全部相关性 ←→ 月份 r 刷新 / 命令 q 退出",
            ),
        ])
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if app.input_mode == InputMode::Command {
                "命令输入模式 (Enter执行 Esc取消 Tab补全 ↑↓历史)"
            } else {
                "命令输入"
            })
            .style(if app.input_mode == InputMode::Command {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with('✓') {
                Style::default().fg(Color::Green)
            } else if msg.starts_with('✗') {
                Style::default().fg(Color::Red)
            } else if msg.starts_with('⚠') {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("日志 (共 {} 条)", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}
