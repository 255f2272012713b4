//! Safety screening of response payloads.
//!
//! Runs over the serialized payload so nested fields are covered.

use crate::model::Payload;
use crate::validation::check::{CheckOutcome, ResponseCheck};
use regex::Regex;
use std::sync::LazyLock;

/// Check name.
pub const SAFETY_CHECK: &str = "safety_validation";

/// Default payload size limit in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 100_000;

static SENSITIVE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("credential", r"(?i)\b(?:password|secret|key|token)\s*[:=]\s*\S+"),
        ("card number", r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b"),
        ("national id", r"\b\d{3}-\d{2}-\d{4}\b"),
    ]
    .into_iter()
    .map(|(label, p)| (label, Regex::new(p).expect("valid regex")))
    .collect()
});

static INJECTION_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("<script>", r"(?i)<script.*?>"),
        ("javascript:", r"(?i)javascript:"),
        ("eval()", r"(?i)eval\s*\("),
        ("exec()", r"(?i)exec\s*\("),
    ]
    .into_iter()
    .map(|(label, p)| (label, Regex::new(p).expect("valid regex")))
    .collect()
});

/// Phrases that suggest internal error details leaked into the output.
pub const LEAK_INDICATORS: &[&str] = &["traceback", "stack trace", "internal error", "debug info"];

/// Safety check.
#[derive(Clone, Debug)]
pub struct SafetyCheck {
    max_payload_bytes: usize,
}

impl SafetyCheck {
    /// Create with a payload size limit.
    pub fn new(max_payload_bytes: usize) -> Self {
        Self { max_payload_bytes }
    }
}

impl Default for SafetyCheck {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_BYTES)
    }
}

impl ResponseCheck for SafetyCheck {
    fn name(&self) -> &str {
        SAFETY_CHECK
    }

    fn gating(&self) -> bool {
        true
    }

    fn check(&self, content: &Payload) -> CheckOutcome {
        let text = content.to_value().to_string();
        let lowered = text.to_lowercase();
        let mut errors = Vec::new();

        for (label, re) in SENSITIVE_PATTERNS.iter() {
            if re.is_match(&text) {
                errors.push(format!("Sensitive data pattern detected: {}", label));
            }
        }

        for (label, re) in INJECTION_PATTERNS.iter() {
            if re.is_match(&text) {
                errors.push(format!("Potential injection detected: {}", label));
            }
        }

        if text.len() > self.max_payload_bytes {
            errors.push(format!(
                "Response exceeds size limit ({} > {} bytes)",
                text.len(),
                self.max_payload_bytes
            ));
        }

        for indicator in LEAK_INDICATORS {
            if lowered.contains(indicator) {
                errors.push(format!("Potential information leakage: {}", indicator));
            }
        }

        CheckOutcome::from_errors(SAFETY_CHECK, errors)
    }
}
