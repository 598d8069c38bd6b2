//! 一次渲染的输入（数据快照 + 筛选条件）到视图模型的纯函数。
//!
//! 界面上所有的选择状态都收在 `Filters` 里，由事件循环持有；
//! `render` 本身没有副作用，方便单独测试。

use crate::analytics::correlation::{correlation_matrix, CorrelationMatrix};
use crate::analytics::cumulative::{series_for, top_series, SeriesLine, DEFAULT_SERIES_COUNT};
use crate::analytics::monthly::{
    available_months, default_month, monthly_movers, monthly_returns, MonthKey, MonthlyMovers,
    MOVERS_COUNT,
};
use crate::analytics::ranking::{
    most_volatile, top_gainers, top_losers, RankedStock, VolatilityEntry, TOP_RANK_LIMIT,
};
use crate::analytics::sector::{sector_returns, sector_tree, SectorNode, SectorReturn};
use crate::analytics::summary::{summarize, MarketSummary};
use crate::analytics::all_symbols;
use crate::storage::repository::{DailyRecord, YearlyRecord};
use chrono::{DateTime, Local};

/// 一次加载得到的两张表
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub yearly: Vec<YearlyRecord>,
    pub daily: Vec<DailyRecord>,
    pub loaded_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    SectorPerformance,
    Volatility,
    CumulativeReturns,
    Correlation,
    GainersLosers,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::SectorPerformance,
        Tab::Volatility,
        Tab::CumulativeReturns,
        Tab::Correlation,
        Tab::GainersLosers,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::SectorPerformance => "板块表现",
            Tab::Volatility => "波动率",
            Tab::CumulativeReturns => "累计收益",
            Tab::Correlation => "相关性",
            Tab::GainersLosers => "月度涨跌榜",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn from_index(i: usize) -> Option<Tab> {
        Tab::ALL.get(i).copied()
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    /// 该页是否有 symbol 多选控件
    pub fn has_symbol_picker(self) -> bool {
        matches!(self, Tab::CumulativeReturns | Tab::Correlation)
    }

    /// 命令行里的 tab 参数：序号(1-5) 或英文别名
    pub fn parse(raw: &str) -> Option<Tab> {
        let t = raw.trim().to_ascii_lowercase();
        if let Ok(n) = t.parse::<usize>() {
            return n.checked_sub(1).and_then(Tab::from_index);
        }
        match t.as_str() {
            "sector" | "sectors" => Some(Tab::SectorPerformance),
            "vol" | "volatility" => Some(Tab::Volatility),
            "cum" | "cumulative" => Some(Tab::CumulativeReturns),
            "corr" | "correlation" => Some(Tab::Correlation),
            "movers" | "monthly" | "gainers" | "losers" => Some(Tab::GainersLosers),
            _ => None,
        }
    }
}

/// 界面控件的取值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub tab: Tab,
    pub cumulative_symbols: Vec<String>,
    pub correlation_show_all: bool,
    pub correlation_symbols: Vec<String>,
    /// None 表示使用最近的月份
    pub month: Option<MonthKey>,
}

impl Filters {
    /// 当前页的多选列表
    pub fn selection(&self) -> Option<&Vec<String>> {
        match self.tab {
            Tab::CumulativeReturns => Some(&self.cumulative_symbols),
            Tab::Correlation => Some(&self.correlation_symbols),
            _ => None,
        }
    }

    pub fn selection_mut(&mut self) -> Option<&mut Vec<String>> {
        match self.tab {
            Tab::CumulativeReturns => Some(&mut self.cumulative_symbols),
            Tab::Correlation => Some(&mut self.correlation_symbols),
            _ => None,
        }
    }

    /// 选中则移除，未选中则追加
    pub fn toggle_symbol(&mut self, symbol: &str) {
        if let Some(sel) = self.selection_mut() {
            if let Some(pos) = sel.iter().position(|s| s == symbol) {
                sel.remove(pos);
            } else {
                sel.push(symbol.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub sectors: Vec<SectorNode>,
    pub summary: MarketSummary,
    pub gainers: Vec<RankedStock>,
    pub losers: Vec<RankedStock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabView {
    Sectors(Vec<SectorReturn>),
    Volatility(Vec<VolatilityEntry>),
    Cumulative {
        symbols: Vec<String>,
        top: Vec<SeriesLine>,
        selected: Vec<SeriesLine>,
    },
    Correlation {
        symbols: Vec<String>,
        full: Option<CorrelationMatrix>,
        selected: Option<CorrelationMatrix>,
    },
    Movers {
        months: Vec<MonthKey>,
        movers: Option<MonthlyMovers>,
    },
}

impl TabView {
    /// 多选控件的候选项
    pub fn picker_symbols(&self) -> &[String] {
        match self {
            TabView::Cumulative { symbols, .. } | TabView::Correlation { symbols, .. } => symbols,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub header: HeaderView,
    pub tab: TabView,
}

pub fn render(snapshot: &MarketSnapshot, filters: &Filters) -> ViewModel {
    ViewModel {
        header: render_header(&snapshot.yearly),
        tab: render_tab(snapshot, filters),
    }
}

fn render_header(yearly: &[YearlyRecord]) -> HeaderView {
    HeaderView {
        sectors: sector_tree(yearly),
        summary: summarize(yearly),
        gainers: top_gainers(yearly, TOP_RANK_LIMIT),
        losers: top_losers(yearly, TOP_RANK_LIMIT),
    }
}

fn render_tab(snapshot: &MarketSnapshot, filters: &Filters) -> TabView {
    match filters.tab {
        Tab::SectorPerformance => TabView::Sectors(sector_returns(&snapshot.yearly)),
        Tab::Volatility => TabView::Volatility(most_volatile(&snapshot.yearly, TOP_RANK_LIMIT)),
        Tab::CumulativeReturns => TabView::Cumulative {
            symbols: all_symbols(&snapshot.daily),
            top: top_series(&snapshot.daily, DEFAULT_SERIES_COUNT),
            selected: series_for(&snapshot.daily, &filters.cumulative_symbols),
        },
        Tab::Correlation => {
            let full = filters
                .correlation_show_all
                .then(|| correlation_matrix(&snapshot.daily, None));
            let selected = (!filters.correlation_symbols.is_empty())
                .then(|| correlation_matrix(&snapshot.daily, Some(&filters.correlation_symbols)));
            TabView::Correlation {
                symbols: all_symbols(&snapshot.daily),
                full,
                selected,
            }
        }
        Tab::GainersLosers => {
            let returns = monthly_returns(&snapshot.daily);
            let months = available_months(&returns);
            // 之前选的月份不在数据里时退回最近月份
            let month = filters
                .month
                .filter(|m| months.contains(m))
                .or_else(|| default_month(&months));
            let movers = month.map(|m| monthly_movers(&returns, m, MOVERS_COUNT));
            TabView::Movers { months, movers }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testkit::{daily, with_returns, yearly};

    fn snapshot() -> MarketSnapshot {
        let mut daily_rows = Vec::new();
        for (sym, closes) in [
            ("AAA", [100.0, 110.0, 121.0]),
            ("BBB", [100.0, 95.0, 90.0]),
        ] {
            for (i, day) in ["2024-01-30", "2024-02-01", "2024-02-02"].iter().enumerate() {
                let cum = closes[i] / closes[0] - 1.0;
                daily_rows.push(with_returns(
                    daily(sym, day, closes[i]),
                    Some(cum + i as f64 * 0.01),
                    Some(cum),
                ));
            }
        }
        MarketSnapshot {
            yearly: vec![
                yearly("AAA", "IT", 10.0),
                yearly("BBB", "BANKING", -5.0),
                yearly("CCC", "IT", 3.0),
            ],
            daily: daily_rows,
            loaded_at: Local::now(),
        }
    }

    #[test]
    fn header_is_rendered_for_every_tab() {
        let snap = snapshot();
        for tab in Tab::ALL {
            let filters = Filters {
                tab,
                ..Default::default()
            };
            let vm = render(&snap, &filters);
            assert_eq!(vm.header.summary.green, 2);
            assert_eq!(vm.header.summary.red, 1);
            assert_eq!(vm.header.gainers[0].symbol, "AAA");
            assert_eq!(vm.header.losers[0].symbol, "BBB");
        }
    }

    #[test]
    fn month_defaults_to_latest_and_ignores_stale_choice() {
        let snap = snapshot();
        let mut filters = Filters {
            tab: Tab::GainersLosers,
            ..Default::default()
        };
        let TabView::Movers { months, movers } = render(&snap, &filters).tab else {
            panic!("expected movers view");
        };
        assert_eq!(months.len(), 2);
        assert_eq!(movers.unwrap().month.to_string(), "2024-02");

        filters.month = Some("1999-01".parse().unwrap());
        let TabView::Movers { movers, .. } = render(&snap, &filters).tab else {
            panic!("expected movers view");
        };
        assert_eq!(movers.unwrap().month.to_string(), "2024-02");

        filters.month = Some("2024-01".parse().unwrap());
        let TabView::Movers { movers, .. } = render(&snap, &filters).tab else {
            panic!("expected movers view");
        };
        assert_eq!(movers.unwrap().month.to_string(), "2024-01");
    }

    #[test]
    fn correlation_panels_follow_toggle_and_selection() {
        let snap = snapshot();
        let mut filters = Filters {
            tab: Tab::Correlation,
            ..Default::default()
        };
        let TabView::Correlation { full, selected, symbols } = render(&snap, &filters).tab else {
            panic!("expected correlation view");
        };
        assert!(full.is_none());
        assert!(selected.is_none());
        assert_eq!(symbols, vec!["AAA", "BBB"]);

        filters.correlation_show_all = true;
        filters.toggle_symbol("BBB");
        let TabView::Correlation { full, selected, .. } = render(&snap, &filters).tab else {
            panic!("expected correlation view");
        };
        assert_eq!(full.unwrap().symbols, vec!["AAA", "BBB"]);
        assert_eq!(selected.unwrap().symbols, vec!["BBB"]);
    }

    #[test]
    fn cumulative_shows_selection_separately() {
        let snap = snapshot();
        let mut filters = Filters {
            tab: Tab::CumulativeReturns,
            ..Default::default()
        };
        filters.toggle_symbol("BBB");
        let TabView::Cumulative { top, selected, .. } = render(&snap, &filters).tab else {
            panic!("expected cumulative view");
        };
        assert_eq!(top[0].symbol, "AAA");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].symbol, "BBB");
        assert_eq!(selected[0].points.len(), 3);
    }

    #[test]
    fn toggle_only_touches_current_tab() {
        let mut filters = Filters::default();
        filters.toggle_symbol("AAA");
        assert!(filters.cumulative_symbols.is_empty());
        assert!(filters.correlation_symbols.is_empty());

        filters.tab = Tab::Correlation;
        filters.toggle_symbol("AAA");
        filters.toggle_symbol("BBB");
        filters.toggle_symbol("AAA");
        assert_eq!(filters.correlation_symbols, vec!["BBB"]);
    }

    #[test]
    fn tab_navigation_wraps() {
        assert_eq!(Tab::SectorPerformance.prev(), Tab::GainersLosers);
        assert_eq!(Tab::GainersLosers.next(), Tab::SectorPerformance);
        assert_eq!(Tab::parse("3"), Some(Tab::CumulativeReturns));
        assert_eq!(Tab::parse("corr"), Some(Tab::Correlation));
        assert_eq!(Tab::parse("0"), None);
        assert_eq!(Tab::parse("9"), None);
    }

    #[test]
    fn empty_snapshot_degrades_gracefully() {
        let snap = MarketSnapshot {
            yearly: Vec::new(),
            daily: Vec::new(),
            loaded_at: Local::now(),
        };
        for tab in Tab::ALL {
            let filters = Filters {
                tab,
                correlation_show_all: true,
                ..Default::default()
            };
            let vm = render(&snap, &filters);
            assert_eq!(vm.header.summary.avg_price, None);
            assert!(vm.header.gainers.is_empty());
            if let TabView::Movers { movers, .. } = vm.tab {
                assert!(movers.is_none());
            }
        }
    }
}
