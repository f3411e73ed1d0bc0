//! Conversion of polled JSON values into numeric samples.

use serde_json::{Map, Value};

/// A decoded poll response: top-level fields keyed by series name.
pub type Payload = Map<String, Value>;

/// Coerce a JSON value into a sample.
///
/// Values are never rejected.  Anything without a numeric reading becomes
/// `NaN`, which then flows through scaling untouched.
///
/// | JSON            | sample            |
/// |-----------------|-------------------|
/// | number          | its value         |
/// | `"12.5"`        | `12.5`            |
/// | `""` / `null`   | `0.0`             |
/// | `true`/`false`  | `1.0` / `0.0`     |
/// | other string    | `NaN`             |
/// | array / object  | `NaN`             |
pub fn coerce(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}
