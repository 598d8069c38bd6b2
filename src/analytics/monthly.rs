use crate::storage::repository::DailyRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MOVERS_COUNT: usize = 5;

/// 自然月，显示为 `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("月份格式应为 YYYY-MM: {}", s))?;
        let year = y
            .parse::<i32>()
            .map_err(|_| format!("无效年份: {}", y))?;
        let month = m
            .parse::<u32>()
            .map_err(|_| format!("无效月份: {}", m))?;
        if !(1..=12).contains(&month) {
            return Err(format!("无效月份: {}", m));
        }
        Ok(Self { year, month })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReturn {
    pub month: MonthKey,
    pub symbol: String,
    pub first_close: f64,
    pub last_close: f64,
    /// 百分比
    pub monthly_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyMovers {
    pub month: MonthKey,
    pub gainers: Vec<MonthlyReturn>,
    pub losers: Vec<MonthlyReturn>,
}

/// 每个 (月份, symbol) 的月内收益：(月末收盘 - 月初收盘) / 月初收盘 × 100。
/// 月初/月末按日期决定。月初收盘为 0 的组合无法计算，直接跳过。
pub fn monthly_returns(daily: &[DailyRecord]) -> Vec<MonthlyReturn> {
    type Edge = (NaiveDate, f64);
    let mut groups: BTreeMap<(MonthKey, &str), (Edge, Edge)> = BTreeMap::new();

    for row in daily {
        let key = (MonthKey::of(row.date), row.symbol.as_str());
        let point = (row.date, row.close);
        groups
            .entry(key)
            .and_modify(|(first, last)| {
                if row.date < first.0 {
                    *first = point;
                }
                if row.date > last.0 {
                    *last = point;
                }
            })
            .or_insert((point, point));
    }

    groups
        .into_iter()
        .filter(|(_, ((_, first), _))| *first != 0.0)
        .map(|((month, symbol), ((_, first), (_, last)))| MonthlyReturn {
            month,
            symbol: symbol.to_string(),
            first_close: first,
            last_close: last,
            monthly_return: (last - first) / first * 100.0,
        })
        .collect()
}

/// 升序、去重
pub fn available_months(returns: &[MonthlyReturn]) -> Vec<MonthKey> {
    let mut months: Vec<MonthKey> = returns.iter().map(|r| r.month).collect();
    months.sort();
    months.dedup();
    months
}

/// 默认选最近的月份
pub fn default_month(months: &[MonthKey]) -> Option<MonthKey> {
    months.last().copied()
}

/// 指定月份的前 n 名涨幅和前 n 名跌幅
pub fn monthly_movers(returns: &[MonthlyReturn], month: MonthKey, n: usize) -> MonthlyMovers {
    let in_month: Vec<&MonthlyReturn> = returns.iter().filter(|r| r.month == month).collect();

    let mut gainers = in_month.clone();
    gainers.sort_by(|a, b| b.monthly_return.total_cmp(&a.monthly_return));
    let mut losers = in_month;
    losers.sort_by(|a, b| a.monthly_return.total_cmp(&b.monthly_return));

    MonthlyMovers {
        month,
        gainers: gainers.into_iter().take(n).cloned().collect(),
        losers: losers.into_iter().take(n).cloned().collect(),
    }
}
