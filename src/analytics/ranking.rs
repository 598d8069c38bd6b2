use crate::storage::repository::YearlyRecord;

pub const TOP_RANK_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedStock {
    pub symbol: String,
    pub avg_price: f64,
    pub yearly_return: f64,
}

impl From<&YearlyRecord> for RankedStock {
    fn from(row: &YearlyRecord) -> Self {
        Self {
            symbol: row.symbol.clone(),
            avg_price: row.avg_price,
            yearly_return: row.yearly_return,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityEntry {
    pub symbol: String,
    pub volatility: f64,
    /// volatility × 100
    pub volatility_pct: f64,
}

/// 年收益率降序，并列时保持存储顺序
pub fn top_gainers(rows: &[YearlyRecord], limit: usize) -> Vec<RankedStock> {
    let mut sorted: Vec<&YearlyRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| b.yearly_return.total_cmp(&a.yearly_return));
    sorted.into_iter().take(limit).map(RankedStock::from).collect()
}

/// 年收益率升序，并列时保持存储顺序
pub fn top_losers(rows: &[YearlyRecord], limit: usize) -> Vec<RankedStock> {
    let mut sorted: Vec<&YearlyRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| a.yearly_return.total_cmp(&b.yearly_return));
    sorted.into_iter().take(limit).map(RankedStock::from).collect()
}

pub fn most_volatile(rows: &[YearlyRecord], limit: usize) -> Vec<VolatilityEntry> {
    let mut sorted: Vec<&YearlyRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| b.volatility.total_cmp(&a.volatility));
    sorted
        .into_iter()
        .take(limit)
        .map(|row| VolatilityEntry {
            symbol: row.symbol.clone(),
            volatility: row.volatility,
            volatility_pct: row.volatility * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testkit::yearly;

    fn universe(n: usize) -> Vec<YearlyRecord> {
        (0..n)
            .map(|i| {
                // 打乱一下顺序，避免输入本身有序
                let ret = ((i * 7) % n) as f64 - (n as f64 / 2.0);
                yearly(&format!("S{:02}", i), "X", ret)
            })
            .collect()
    }

    #[test]
    fn scenario_top_gainer() {
        let rows = vec![
            yearly("A", "IT", 10.0),
            yearly("B", "IT", -5.0),
            yearly("C", "IT", 3.0),
        ];
        let gainers = top_gainers(&rows, TOP_RANK_LIMIT);
        assert_eq!(gainers[0].symbol, "A");
        assert_eq!(gainers.len(), 3);
        let losers = top_losers(&rows, TOP_RANK_LIMIT);
        assert_eq!(losers[0].symbol, "B");
    }

    #[test]
    fn gainers_descending_losers_ascending() {
        let rows = universe(23);
        let gainers = top_gainers(&rows, TOP_RANK_LIMIT);
        let losers = top_losers(&rows, TOP_RANK_LIMIT);
        assert_eq!(gainers.len(), 10);
        assert_eq!(losers.len(), 10);
        assert!(gainers
            .windows(2)
            .all(|w| w[0].yearly_return >= w[1].yearly_return));
        assert!(losers
            .windows(2)
            .all(|w| w[0].yearly_return <= w[1].yearly_return));
    }

    #[test]
    fn fewer_rows_than_limit() {
        let rows = universe(4);
        assert_eq!(top_gainers(&rows, TOP_RANK_LIMIT).len(), 4);
        assert!(top_losers(&[], TOP_RANK_LIMIT).is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let rows = vec![
            yearly("FIRST", "IT", 5.0),
            yearly("LOW", "IT", 1.0),
            yearly("SECOND", "IT", 5.0),
        ];
        let gainers = top_gainers(&rows, 2);
        assert_eq!(gainers[0].symbol, "FIRST");
        assert_eq!(gainers[1].symbol, "SECOND");
    }

    #[test]
    fn volatility_is_rescaled_to_percent() {
        let mut a = yearly("A", "IT", 0.0);
        a.volatility = 0.025;
        let mut b = yearly("B", "IT", 0.0);
        b.volatility = 0.031;
        let ranked = most_volatile(&[a, b], TOP_RANK_LIMIT);
        assert_eq!(ranked[0].symbol, "B");
        assert!((ranked[0].volatility_pct - 3.1).abs() < 1e-9);
        assert!((ranked[1].volatility_pct - 2.5).abs() < 1e-9);
    }
}
