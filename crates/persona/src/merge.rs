//! Deep-merge of JSON objects.
//!
//! Objects merge key by key, recursively. Every other value (arrays
//! included) replaces the target wholesale. Inputs are decoded JSON, so
//! there are no cycles to guard against.

use serde_json::{Map, Value};

/// Merge `source` into `target` and return `target`.
///
/// For each key of `source`: when both sides hold an object, recurse;
/// otherwise the source value replaces (or adds) the target value. Keys
/// present only in `target` are left untouched.
pub fn deep_merge(target: &mut Map<String, Value>, source: Map<String, Value>) -> &mut Map<String, Value> {
    for (key, incoming) in source {
        match incoming {
            Value::Object(nested) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => {
                    deep_merge(existing, nested);
                }
                _ => {
                    target.insert(key, Value::Object(nested));
                }
            },
            Value::Array(_) | Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {
                target.insert(key, incoming);
            }
        }
    }
    target
}
