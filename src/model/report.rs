//! Per-response validation report.

use serde::{Deserialize, Serialize};

/// Outcome of validating one engine response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the schema check passed
    pub schema_ok: bool,
    /// Names of the checks that passed, in evaluation order
    pub rules: Vec<String>,
    /// Percentage of checks passed (0-100)
    pub score: f64,
    /// Errors raised by failing checks
    pub errors: Vec<String>,
    /// Non-exclusionary findings
    pub warnings: Vec<String>,
    /// Failed checks that exclude the response regardless of score
    pub hard_failures: Vec<String>,
}

impl ValidationReport {
    /// Whether the response may take part in consensus.
    pub fn qualifies(&self, threshold: f64) -> bool {
        self.hard_failures.is_empty() && self.score >= threshold
    }

    /// Whether every check passed without warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}
