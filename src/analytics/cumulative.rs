use crate::analytics::dedup_preserving_order;
use crate::storage::repository::DailyRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const DEFAULT_SERIES_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct FinalReturn {
    pub symbol: String,
    pub final_return: f64,
}

/// 单个 symbol 的累计收益曲线，按日期升序
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLine {
    pub symbol: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// 每个 symbol 取日期最大且有值的那一行，不依赖行的原始顺序。
/// 结果按最终收益降序，并列按 symbol 升序。
pub fn final_returns(daily: &[DailyRecord]) -> Vec<FinalReturn> {
    let mut latest: BTreeMap<&str, (NaiveDate, f64)> = BTreeMap::new();
    for row in daily {
        let Some(value) = row.cumulative_return else {
            continue;
        };
        let newer = latest
            .get(row.symbol.as_str())
            .map_or(true, |(date, _)| row.date > *date);
        if newer {
            latest.insert(row.symbol.as_str(), (row.date, value));
        }
    }

    let mut out: Vec<FinalReturn> = latest
        .into_iter()
        .map(|(symbol, (_, value))| FinalReturn {
            symbol: symbol.to_string(),
            final_return: value,
        })
        .collect();
    out.sort_by(|a, b| b.final_return.total_cmp(&a.final_return));
    out
}

/// 按给定顺序输出每个 symbol 的曲线，数据里不存在的 symbol 跳过
pub fn series_for(daily: &[DailyRecord], symbols: &[String]) -> Vec<SeriesLine> {
    let wanted = dedup_preserving_order(symbols);
    let mut points: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for row in daily {
        if !wanted.iter().any(|s| s == &row.symbol) {
            continue;
        }
        if let Some(value) = row.cumulative_return {
            points
                .entry(row.symbol.as_str())
                .or_default()
                .push((row.date, value));
        }
    }

    wanted
        .iter()
        .filter_map(|symbol| {
            let mut pts = points.remove(symbol.as_str())?;
            pts.sort_by_key(|(date, _)| *date);
            Some(SeriesLine {
                symbol: symbol.clone(),
                points: pts,
            })
        })
        .collect()
}

/// 最终收益最高的 n 个 symbol 的曲线
pub fn top_series(daily: &[DailyRecord], n: usize) -> Vec<SeriesLine> {
    let leaders: Vec<String> = final_returns(daily)
        .into_iter()
        .take(n)
        .map(|f| f.symbol)
        .collect();
    series_for(daily, &leaders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testkit::{daily, with_returns};

    fn row(symbol: &str, day: &str, cum: Option<f64>) -> DailyRecord {
        with_returns(daily(symbol, day, 100.0), None, cum)
    }

    #[test]
    fn last_value_uses_date_not_row_order() {
        let rows = vec![
            row("TCS", "2024-03-01", Some(0.30)),
            row("TCS", "2024-01-01", Some(0.10)),
            row("TCS", "2024-02-01", Some(0.20)),
        ];
        let out = final_returns(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].final_return, 0.30);
    }

    #[test]
    fn null_tail_falls_back_to_latest_value() {
        let rows = vec![
            row("TCS", "2024-01-01", Some(0.10)),
            row("TCS", "2024-01-02", None),
            row("EMPTY", "2024-01-01", None),
        ];
        let out = final_returns(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "TCS");
        assert_eq!(out[0].final_return, 0.10);
    }

    #[test]
    fn top_series_picks_leaders_in_rank_order() {
        let mut rows = Vec::new();
        for (i, sym) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
            rows.push(row(sym, "2024-01-02", Some(i as f64)));
            rows.push(row(sym, "2024-01-01", Some(0.0)));
        }
        let lines = top_series(&rows, DEFAULT_SERIES_COUNT);
        let symbols: Vec<&str> = lines.iter().map(|l| l.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["G", "F", "E", "D", "C"]);
        // 点按日期升序
        assert!(lines[0].points[0].0 < lines[0].points[1].0);
    }

    #[test]
    fn selection_keeps_order_and_skips_unknown() {
        let rows = vec![
            row("A", "2024-01-01", Some(1.0)),
            row("B", "2024-01-01", Some(2.0)),
        ];
        let selection = vec!["B".to_string(), "ZZZ".to_string(), "A".to_string()];
        let lines = series_for(&rows, &selection);
        let symbols: Vec<&str> = lines.iter().map(|l| l.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["B", "A"]);
        assert!(series_for(&rows, &[]).is_empty());
    }
}
