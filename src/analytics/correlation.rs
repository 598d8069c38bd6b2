//! 日收益率的相关系数矩阵。
//!
//! 先把日线数据透视成 (date × symbol) 的矩阵，丢弃任何一列有缺失值的日期，
//! 再对剩下的完整行计算两两 Pearson 相关系数，保留两位小数。
//!
//! 注意：选择子集时是先只保留子集的列、再丢弃缺失行，所以子集里的
//! 相关系数不一定等于全量矩阵里对应的那一格。加入的 symbol 越多，
//! 被丢弃的日期越多。

use crate::analytics::dedup_preserving_order;
use crate::storage::repository::DailyRecord;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    /// 行/列顺序
    pub symbols: Vec<String>,
    /// N×N，样本不足或方差为 0 时为 None
    pub values: Vec<Vec<Option<f64>>>,
    /// 参与计算的完整日期数
    pub observations: usize,
}

impl CorrelationMatrix {
    #[cfg(test)]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.values[i][j]
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Pearson 相关系数；长度不一致、少于 2 个样本或任一序列没有波动时返回 None
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// (date × symbol) 透视，没有对应行或收益为空的格子记为 None
fn pivot_returns(daily: &[DailyRecord], columns: &[String]) -> BTreeMap<NaiveDate, Vec<Option<f64>>> {
    let index: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let mut pivot: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for row in daily {
        let Some(&col) = index.get(row.symbol.as_str()) else {
            continue;
        };
        let cells = pivot
            .entry(row.date)
            .or_insert_with(|| vec![None; columns.len()]);
        cells[col] = row.daily_return;
    }
    pivot
}

/// `subset` 为 None 时使用全部 symbol（升序）；否则只用子集的列，按选择顺序排列，
/// 数据中不存在的 symbol 会被忽略
pub fn correlation_matrix(daily: &[DailyRecord], subset: Option<&[String]>) -> CorrelationMatrix {
    let present: BTreeSet<&str> = daily.iter().map(|r| r.symbol.as_str()).collect();
    let columns: Vec<String> = match subset {
        Some(selected) => dedup_preserving_order(selected)
            .into_iter()
            .filter(|s| present.contains(s.as_str()))
            .collect(),
        None => present.iter().map(|s| s.to_string()).collect(),
    };

    let n = columns.len();
    let complete: Vec<Vec<f64>> = pivot_returns(daily, &columns)
        .into_values()
        .filter_map(|cells| cells.into_iter().collect::<Option<Vec<f64>>>())
        .collect();

    let series: Vec<Vec<f64>> = (0..n)
        .map(|j| complete.iter().map(|row| row[j]).collect())
        .collect();

    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let corr = pearson(&series[i], &series[j]).map(round2);
            values[i][j] = corr;
            values[j][i] = corr;
        }
    }

    CorrelationMatrix {
        symbols: columns,
        values,
        observations: complete.len(),
    }
}
