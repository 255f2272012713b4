//! Structural check of response payloads.

use crate::model::payload::{CONFIDENCE_FIELD, MODEL_FIELD, RESPONSE_FIELD};
use crate::model::Payload;
use crate::validation::check::{CheckOutcome, ResponseCheck};
use serde_json::Value;

/// Check name.
pub const SCHEMA_CHECK: &str = "schema_validation";

/// `response` non-empty string, `model` string, optional `confidence` in [0, 1].
#[derive(Clone, Debug, Default)]
pub struct SchemaCheck;

impl ResponseCheck for SchemaCheck {
    fn name(&self) -> &str {
        SCHEMA_CHECK
    }

    fn gating(&self) -> bool {
        true
    }

    fn check(&self, content: &Payload) -> CheckOutcome {
        let mut errors = Vec::new();

        match content.get(RESPONSE_FIELD) {
            None => errors.push("Missing 'response' field".to_string()),
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(_) => {
                errors.push("Invalid 'response' field - must be non-empty string".to_string())
            }
        }

        match content.get(MODEL_FIELD) {
            None => errors.push("Missing 'model' field".to_string()),
            Some(Value::String(_)) => {}
            Some(_) => errors.push("Invalid 'model' field - must be a string".to_string()),
        }

        if let Some(confidence) = content.get(CONFIDENCE_FIELD) {
            let in_range = confidence
                .as_f64()
                .is_some_and(|c| (0.0..=1.0).contains(&c));
            if !in_range {
                errors.push("Invalid confidence value - must be between 0 and 1".to_string());
            }
        }

        CheckOutcome::from_errors(SCHEMA_CHECK, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::check::CheckStatus;

    #[test]
    fn test_minimal_payload_passes() {
        let outcome = SchemaCheck.check(&Payload::text("X", "m"));
        assert_eq!(outcome.status, CheckStatus::Passed);
    }

    #[test]
    fn test_missing_response_fails() {
        let outcome = SchemaCheck.check(&Payload::new().with("model", "m"));
        assert_eq!(outcome.status, CheckStatus::Failed);
        assert_eq!(outcome.findings, vec!["Missing 'response' field".to_string()]);
    }

    #[test]
    fn test_empty_response_fails() {
        let outcome = SchemaCheck.check(&Payload::text("", "m"));
        assert_eq!(outcome.status, CheckStatus::Failed);
    }

    #[test]
    fn test_confidence_range() {
        let ok = Payload::text("X", "m").with("confidence", 0.9);
        let high = Payload::text("X", "m").with("confidence", 1.5);
        let text = Payload::text("X", "m").with("confidence", "high");

        assert_eq!(SchemaCheck.check(&ok).status, CheckStatus::Passed);
        assert_eq!(SchemaCheck.check(&high).status, CheckStatus::Failed);
        assert_eq!(SchemaCheck.check(&text).status, CheckStatus::Failed);
    }

    #[test]
    fn test_schema_is_gating() {
        assert!(SchemaCheck.gating());
    }
}
