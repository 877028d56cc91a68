//! Decimal coercion for amounts that arrive as JSON numbers or strings.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

/// Coerce a JSON value to a [`Decimal`]. Numbers go through their canonical
/// text form so integers and floats both parse exactly as serialized;
/// strings are trimmed first.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(repr: &str) -> Option<Decimal> {
    Decimal::from_str(repr)
        .ok()
        .or_else(|| Decimal::from_scientific(repr).ok())
}
