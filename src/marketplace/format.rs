const MILLION: i64 = 1_000_000;
const THOUSAND: i64 = 1_000;

/// Compact follower-style number: `950`, `6.5K`, `1.2M`. Zero and missing read as `0`.
pub fn format_number(value: Option<i64>) -> String {
    match value.unwrap_or(0) {
        0 => "0".to_string(),
        n if n >= MILLION => format!("{:.1}M", n as f64 / MILLION as f64),
        n if n >= THOUSAND => format!("{:.1}K", n as f64 / THOUSAND as f64),
        n => n.to_string(),
    }
}

/// Whole-dollar amount with thousands separators, e.g. `$1,250`.
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Weekly price range as shown on directory cards.
pub fn format_price_range(min: Option<i64>, max: Option<i64>) -> Option<String> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo == hi => Some(format!("{}/wk", format_currency(lo))),
        (Some(lo), Some(hi)) => Some(format!(
            "{}-{}/wk",
            format_currency(lo),
            format_currency(hi)
        )),
        (Some(lo), None) => Some(format!("from {}/wk", format_currency(lo))),
        (None, Some(hi)) => Some(format!("up to {}/wk", format_currency(hi))),
        (None, None) => None,
    }
}
