//! Canonical serialization for signature stability
//!
//! Two payloads that differ only in object key order must sign identically.
//! [`serialize`] sorts every object's keys lexicographically (recursively,
//! including objects nested in arrays), renders compact JSON, and then encodes
//! that JSON text once more as a JSON string literal so the signer always
//! receives a flat string regardless of the input shape.
//!
//! ```rust
//! use relaybox_security::canonical::serialize;
//! use serde_json::json;
//!
//! let a = serialize(&json!({ "z": 98, "a": 123, "c": 5 })).unwrap();
//! assert_eq!(a, r#""{\"a\":123,\"c\":5,\"z\":98}""#);
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Canonically serialize a JSON value.
///
/// # Errors
///
/// Returns a `SignatureError` if the value cannot be rendered as JSON text.
pub fn serialize(data: &Value) -> Result<String> {
    let canonical = serde_json::to_string(&sort_keys(data))
        .map_err(|e| Error::signature(format!("Failed to serialize data, {e}")))?;

    serde_json::to_string(&canonical)
        .map_err(|e| Error::signature(format!("Failed to serialize data, {e}")))
}

/// Canonically serialize any serializable value.
///
/// The value is first converted into a JSON value, so map types with
/// non-string keys or failing `Serialize` impls are rejected here.
///
/// # Errors
///
/// Returns a `SignatureError` if the value cannot be represented as JSON.
pub fn serialize_value<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let value = serde_json::to_value(data)
        .map_err(|e| Error::signature(format!("Failed to serialize data, {e}")))?;

    serialize(&value)
}

/// Return a copy of `value` with every object's keys in lexicographic order.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key.clone(), sort_keys(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
