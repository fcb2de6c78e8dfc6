//! Tolerant number decoding for documents written by older clients
//!
//! Stored documents and client snapshots are not always typed the way the
//! current models are: integers come back as doubles and some clients send
//! numbers as strings.

use crate::core::field::{parse_leading_float, parse_leading_int};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Integer view of a JSON value: numbers (truncated) or a leading-integer string
pub fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

/// Float view of a JSON value: numbers or a leading-decimal string
///
/// Overflowing values such as `"1e999"` are `None`; JSON has no infinity.
pub fn to_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(s),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Integer that may arrive as a double or a numeric string; anything else is 0
pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_int(&value).unwrap_or_default())
}

/// Optional integer with the same tolerance as [`int`]
pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(to_int))
}

/// Optional float that may arrive as a numeric string
pub fn opt_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(to_float))
}

/// Optional string that may arrive as a number (ids written by older seeds)
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
