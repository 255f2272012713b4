//! Engine payload map.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key of the generated text field.
pub const RESPONSE_FIELD: &str = "response";
/// Key of the declared model identifier.
pub const MODEL_FIELD: &str = "model";
/// Key of the optional confidence value.
pub const CONFIDENCE_FIELD: &str = "confidence";
/// Key carrying the error kind of a sentinel payload.
pub const ERROR_FIELD: &str = "error";

/// Key-value content returned by an engine.
///
/// The map is opaque to everything except the validator, which checks the
/// required and optional fields before a payload can take part in consensus.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Value>);

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload with the text and model fields set.
    pub fn text(response: &str, model: &str) -> Self {
        Self::new()
            .with(RESPONSE_FIELD, response)
            .with(MODEL_FIELD, model)
    }

    /// Sentinel payload `{error: <kind>}`.
    pub fn error(kind: &str) -> Self {
        Self::new().with(ERROR_FIELD, kind)
    }

    /// Add a field.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a field.
    pub fn insert(&mut self, key: &str, value: impl Serialize) {
        if let Ok(v) = serde_json::to_value(value) {
            self.0.insert(key.to_string(), v);
        }
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether a field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Generated text, if present and a string.
    pub fn response_text(&self) -> Option<&str> {
        self.get_str(RESPONSE_FIELD)
    }

    /// Error kind of a sentinel payload.
    pub fn error_kind(&self) -> Option<&str> {
        self.get_str(ERROR_FIELD)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    /// Convert to a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }

    /// Compact JSON rendering truncated to `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let full = self.to_value().to_string();
        if full.chars().count() <= max_chars {
            full
        } else {
            let truncated: String = full.chars().take(max_chars).collect();
            format!("{}...", truncated)
        }
    }
}

impl From<BTreeMap<String, Value>> for Payload {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Payload {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(Error::ValidationFailure(format!(
                "payload must be an object, got {}",
                other
            ))),
        }
    }
}
