//! Small helpers over raw JSON records.

use serde_json::{Map, Value};

/// Keys tried, in order, for an item's display name.
const NATURAL_KEYS: [&str; 3] = ["persona_name", "product_name", "name"];

/// A value counts as blank when it is null, a whitespace-only string, or an
/// empty list/object. Numbers and booleans are never blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Present and non-blank.
pub fn is_filled(record: &Map<String, Value>, field: &str) -> bool {
    record.get(field).is_some_and(|v| !is_blank(v))
}

/// The item's natural display name, if it has one.
pub fn natural_key(record: &Map<String, Value>) -> Option<&str> {
    NATURAL_KEYS.iter().find_map(|key| {
        record
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    })
}

/// A non-blank string field.
pub fn str_field<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Round to 4 decimal places.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// `part / total`, rounded; 0.0 when `total` is zero.
pub fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round4(part as f64 / total as f64)
}

/// Arithmetic mean, rounded; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round4(values.iter().sum::<f64>() / values.len() as f64)
}
