//! Generation request sent to every engine.

use crate::core::new_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Sampling controls shared by all engines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationControls {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Stop markers
    #[serde(default)]
    pub stop: Vec<String>,
}

impl Default for GenerationControls {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1000,
            stop: Vec::new(),
        }
    }
}

impl GenerationControls {
    /// Controls used for deterministic subordinate calls.
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            temperature: 0.0,
            max_tokens,
            stop: Vec::new(),
        }
    }
}

/// One logical request fanned out to all engines.
///
/// Built once by the caller through the `with_*` builders and read-only
/// afterwards: the pipeline only ever borrows it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Unique request identifier
    pub id: String,
    /// Prompt template with `{key}` placeholders
    pub template: String,
    /// Template inputs
    pub inputs: BTreeMap<String, Value>,
    /// Sampling controls
    pub controls: GenerationControls,
}

impl GenerationRequest {
    /// Create a new request with a random id and default controls.
    pub fn new(template: &str) -> Self {
        Self {
            id: new_id(),
            template: template.to_string(),
            inputs: BTreeMap::new(),
            controls: GenerationControls::default(),
        }
    }

    /// Set the request id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Add an input. A repeated key replaces the earlier value.
    pub fn with_input(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.inputs.insert(key.to_string(), v);
        }
        self
    }

    /// Replace the controls.
    pub fn with_controls(mut self, controls: GenerationControls) -> Self {
        self.controls = controls;
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.controls.temperature = temperature;
        self
    }

    /// Set max output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.controls.max_tokens = max_tokens;
        self
    }

    /// Add a stop marker.
    pub fn with_stop(mut self, marker: &str) -> Self {
        self.controls.stop.push(marker.to_string());
        self
    }

    /// Substitute `{key}` placeholders with their inputs.
    ///
    /// String inputs are inserted verbatim, anything else as compact JSON.
    /// Placeholders without a matching input are left untouched.
    pub fn render(&self) -> String {
        let mut rendered = self.template.clone();
        for (key, value) in &self.inputs {
            let placeholder = format!("{{{}}}", key);
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            rendered = rendered.replace(&placeholder, &text);
        }
        rendered
    }
}
