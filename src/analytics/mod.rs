//! 看板上每个图表背后的纯计算。
//!
//! 所有函数只依赖传入的两张表的记录和用户的筛选条件，不访问数据库，
//! 每次渲染都重新计算。

pub mod correlation;
pub mod cumulative;
pub mod monthly;
pub mod ranking;
pub mod sector;
pub mod summary;

use crate::storage::repository::DailyRecord;
use std::collections::BTreeSet;

/// 日线数据中出现过的全部 symbol，升序
pub fn all_symbols(daily: &[DailyRecord]) -> Vec<String> {
    daily
        .iter()
        .map(|r| r.symbol.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 去重并保留首次出现的顺序
pub(crate) fn dedup_preserving_order(symbols: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    symbols
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .cloned()
        .collect()
}
