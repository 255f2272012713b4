//! Generation intent presented to the policy gate.

use crate::core::{new_id, now, Timestamp};
use crate::model::GenerationRequest;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Intent kind for redundant generation.
pub const GENERATE_KIND: &str = "TMR_GENERATE";

/// Default risk level of a standard generation request.
pub const DEFAULT_RISK_LEVEL: f64 = 0.1;

/// Default expected productivity gain.
pub const DEFAULT_EXPECTED_GAIN: f64 = 3.0;

/// Abstract view of a request for admission and tracing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationIntent {
    /// Intent id
    pub id: String,
    /// Intent kind
    pub kind: String,
    /// Originating request id
    pub prompt_id: String,
    /// Prompt template
    pub template: String,
    /// Number of template inputs
    pub input_count: usize,
    /// Risk indicator (0-1)
    pub risk_level: f64,
    /// Expected productivity gain
    pub expected_gain: f64,
    /// Creation time
    pub created: Timestamp,
}

impl GenerationIntent {
    /// Map a request to its intent.
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            id: new_id(),
            kind: GENERATE_KIND.to_string(),
            prompt_id: request.id.clone(),
            template: request.template.clone(),
            input_count: request.inputs.len(),
            risk_level: DEFAULT_RISK_LEVEL,
            expected_gain: DEFAULT_EXPECTED_GAIN,
            created: now(),
        }
    }

    /// Set the risk level.
    pub fn with_risk_level(mut self, risk_level: f64) -> Self {
        self.risk_level = risk_level.clamp(0.0, 1.0);
        self
    }

    /// Set the expected gain.
    pub fn with_expected_gain(mut self, expected_gain: f64) -> Self {
        self.expected_gain = expected_gain;
        self
    }

    /// Flat context the guardrail conditions evaluate against.
    pub fn context(&self) -> HashMap<String, Value> {
        let mut context = HashMap::new();
        context.insert("kind".to_string(), json!(self.kind));
        context.insert("prompt_id".to_string(), json!(self.prompt_id));
        context.insert("template".to_string(), json!(self.template));
        context.insert(
            "template_length".to_string(),
            json!(self.template.trim().chars().count()),
        );
        context.insert("input_count".to_string(), json!(self.input_count));
        context.insert("risk_level".to_string(), json!(self.risk_level));
        context.insert("expected_gain".to_string(), json!(self.expected_gain));
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request() {
        let request = GenerationRequest::new("Analyze {x}")
            .with_id("req-7")
            .with_input("x", "y");
        let intent = GenerationIntent::from_request(&request);

        assert_eq!(intent.kind, GENERATE_KIND);
        assert_eq!(intent.prompt_id, "req-7");
        assert_eq!(intent.input_count, 1);
        assert_eq!(intent.risk_level, DEFAULT_RISK_LEVEL);
    }

    #[test]
    fn test_risk_clamped() {
        let intent = GenerationIntent::from_request(&GenerationRequest::new("t")).with_risk_level(4.0);
        assert_eq!(intent.risk_level, 1.0);
    }

    #[test]
    fn test_context_fields() {
        let intent = GenerationIntent::from_request(&GenerationRequest::new("  abc  "));
        let context = intent.context();
        assert_eq!(context["template_length"], json!(3));
        assert_eq!(context["kind"], json!(GENERATE_KIND));
    }
}
