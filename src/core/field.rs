//! Field normalization, coercion and format checks

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Strip every whitespace character from a phone number
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Regional mobile format: optional `+91` or leading `0`, then a digit 6-9 and nine more digits
pub fn is_valid_mobile(phone: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^(?:\+91|0)?[6-9]\d{9}$").expect("phone pattern is valid")
    });
    regex.is_match(phone)
}

/// Non-blank string content of a JSON value, trimmed
///
/// Numbers are accepted and rendered as strings (room numbers often arrive as `101`).
pub fn non_blank(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a decimal from the start of the string (`"12.5 INR"` → 12.5)
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();
    let regex = FLOAT_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("float pattern is valid")
    });
    regex
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse an integer from the start of the string (`"3 chillies"` → 3)
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    static INT_PREFIX: OnceLock<Regex> = OnceLock::new();
    let regex =
        INT_PREFIX.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("integer pattern is valid"));
    regex
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Form-style truthiness: `true`, `"true"` and `"1"` are true, everything else false
pub fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}
