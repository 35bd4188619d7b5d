//! Deep set-like merge of nested mappings
//!
//! The foundation every schema-producing component accumulates through. Only
//! keys matter; the first value seen for a key is preserved, and two nested
//! mappings at the same key merge recursively.

use serde_json::{Map, Value};

use crate::error::Error;

/// Merge two nested mappings as sets.
///
/// Every key of `other` absent from `this` is inserted as-is. When a key is
/// present in both and **both** values are mappings, they merge recursively;
/// any other collision keeps the value from `this` and silently drops the
/// incoming one. First-shape-wins makes accumulation idempotent, but it also
/// makes the operation non-commutative when shapes conflict at a key.
///
/// Fails only when either argument is not a mapping (`Null` being the
/// uninitialized case); an empty mapping is a valid input.
pub fn merge_as_set(this: &Value, other: &Value) -> Result<Value, Error> {
    match (this, other) {
        (Value::Object(a), Value::Object(b)) => Ok(Value::Object(merge_objects(a, b))),
        _ => Err(Error::InvalidMerge),
    }
}

pub(crate) fn merge_objects(
    this: &Map<String, Value>,
    other: &Map<String, Value>,
) -> Map<String, Value> {
    let mut result = this.clone();
    for (key, incoming) in other {
        match result.get_mut(key) {
            None => {
                result.insert(key.clone(), incoming.clone());
            }
            Some(existing) => {
                if let (Some(a), Some(b)) = (existing.as_object(), incoming.as_object()) {
                    let merged = merge_objects(a, b);
                    *existing = Value::Object(merged);
                }
                // Otherwise the existing value stands; the incoming one is dropped.
            }
        }
    }
    result
}
