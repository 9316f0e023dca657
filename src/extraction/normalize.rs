//! Monetary field normalization.
//!
//! The model reports amounts however it saw them: a JSON number, a
//! currency-formatted string, or nothing at all. This is the single point
//! that turns all of those into `Option<f64>`. It never fails — anything
//! unparseable is `None`, which downstream means "not extracted", never
//! zero.

use serde_json::Value;

/// Normalize one scalar amount value from the model's payload.
pub fn normalize_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_currency(s),
        _ => None,
    }
}

/// Strip currency symbols and group separators, then parse as decimal.
fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
