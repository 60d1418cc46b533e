//! Helpers for reading loosely typed JSON values.
//!
//! Tool callers send argument maps where numbers sometimes arrive as JSON
//! strings ("42") and sometimes as numbers (42). These helpers normalize
//! both forms without forcing a strict schema on the caller.

use serde_json::Value;

/// Read an integer out of a JSON value, accepting numbers and numeric
/// strings. Floats are accepted only when they carry no fractional part.
///
/// Returns `None` for anything else (null, booleans, arrays, objects,
/// non-numeric strings).
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
