use crate::storage::repository::YearlyRecord;
use std::collections::{BTreeMap, BTreeSet};

/// 树图用的 sector -> company 层级
#[derive(Debug, Clone, PartialEq)]
pub struct SectorNode {
    pub sector: String,
    pub companies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnBucket {
    Gain,
    Loss,
}

impl ReturnBucket {
    /// 0 归入上涨一侧
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            ReturnBucket::Gain
        } else {
            ReturnBucket::Loss
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorReturn {
    pub sector: String,
    pub avg_yearly_return: f64,
    pub bucket: ReturnBucket,
}

pub fn sector_tree(rows: &[YearlyRecord]) -> Vec<SectorNode> {
    let mut tree: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        tree.entry(row.sector.as_str())
            .or_default()
            .insert(row.company.as_str());
    }
    tree.into_iter()
        .map(|(sector, companies)| SectorNode {
            sector: sector.to_string(),
            companies: companies.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

/// 按 sector 名称升序，而不是按数值排序，保证横轴稳定
pub fn sector_returns(rows: &[YearlyRecord]) -> Vec<SectorReturn> {
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = acc.entry(row.sector.as_str()).or_insert((0.0, 0));
        entry.0 += row.yearly_return;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(sector, (sum, count))| {
            let avg = sum / count as f64;
            SectorReturn {
                sector: sector.to_string(),
                avg_yearly_return: avg,
                bucket: ReturnBucket::of(avg),
            }
        })
        .collect()
}
