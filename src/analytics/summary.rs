use crate::storage::repository::YearlyRecord;

/// 顶部四个指标
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSummary {
    pub total: usize,
    pub green: usize,
    pub red: usize,
    pub flat: usize,
    /// 空表时为 None，界面显示 N/A
    pub avg_price: Option<f64>,
    pub avg_volume: Option<f64>,
}

pub fn summarize(rows: &[YearlyRecord]) -> MarketSummary {
    let mut summary = MarketSummary {
        total: rows.len(),
        ..Default::default()
    };
    if rows.is_empty() {
        return summary;
    }

    let mut price_sum = 0.0;
    let mut volume_sum = 0.0;
    for row in rows {
        if row.yearly_return > 0.0 {
            summary.green += 1;
        } else if row.yearly_return < 0.0 {
            summary.red += 1;
        } else {
            summary.flat += 1;
        }
        price_sum += row.avg_price;
        volume_sum += row.avg_volume;
    }

    let n = rows.len() as f64;
    summary.avg_price = Some(price_sum / n);
    summary.avg_volume = Some(volume_sum / n);
    summary
}

/// 千分位格式化，例如 1234567.891 -> "1,234,567.89"
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut out = String::with_capacity(raw.len() + raw.len() / 3 + 1);
    // 按舍入后的结果判断符号，避免 "-0.00"
    if value < 0.0 && raw.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn format_price(value: Option<f64>) -> String {
    value
        .map(|v| format!("₹{}", group_thousands(v, 2)))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_volume(value: Option<f64>) -> String {
    value
        .map(|v| group_thousands(v, 0))
        .unwrap_or_else(|| "N/A".to_string())
}
