//! Canonical serialization and content digests.
//!
//! Two engines agree when their payloads hash identically, so the canonical
//! form must not depend on field order or on per-call volatile values.

use crate::core::crypto::sha3_256;
use crate::core::Hash256;
use crate::model::payload::Payload;
use serde_json::{Map, Value};

/// Top-level payload fields excluded from the canonical form.
pub const VOLATILE_FIELDS: &[&str] = &["timestamp", "latency_ms"];

/// Rebuild a JSON value with every object's keys in sorted order.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with sorted keys.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

/// Canonical form of a payload: volatile fields dropped, keys sorted.
pub fn canonicalize(payload: &Payload) -> String {
    let mut map = Map::new();
    for (key, value) in payload.as_map() {
        if !VOLATILE_FIELDS.contains(&key.as_str()) {
            map.insert(key.clone(), value.clone());
        }
    }
    canonical_json(&Value::Object(map))
}

/// SHA3-256 over the canonical form.
pub fn content_hash(payload: &Payload) -> Hash256 {
    sha3_256(canonicalize(payload).as_bytes())
}
