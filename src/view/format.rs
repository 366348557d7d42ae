//! Display formatting for traced values.
//!
//! Renderers receive strings produced here and never format raw values
//! themselves.

use serde_json::Value;

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
const INT32_MAX: f64 = 2_147_483_647.0;
const INT32_MIN: f64 = -2_147_483_648.0;

/// Format a number for a cell: sentinels become infinity symbols, integers
/// print as-is and everything else is fixed to three decimals.
pub fn format_number(value: f64) -> String {
    if value == f64::INFINITY || value == MAX_SAFE_INTEGER || value == INT32_MAX {
        return "∞".to_string();
    }
    if value == f64::NEG_INFINITY || value == -MAX_SAFE_INTEGER || value == INT32_MIN {
        return "-∞".to_string();
    }
    if value.is_finite() && value.fract() == 0.0 {
        if value.abs() < 1e18 {
            return format!("{}", value as i64);
        }
        return format!("{value}");
    }
    if value.is_nan() {
        return "NaN".to_string();
    }
    format!("{value:.3}")
}

/// Format any traced value for display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "T".to_string(),
        Value::Bool(false) => "F".to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// String conversion used when values are appended to text, matching how
/// script runtimes stringify values during concatenation.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(number_text).unwrap_or_else(|| n.to_string()),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(text_of).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

pub(crate) fn number_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e18 {
        format!("{}", value as i64)
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{value}")
    }
}
