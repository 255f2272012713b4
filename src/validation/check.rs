//! Check seam shared by every validation rule.

use crate::model::Payload;
use serde::{Deserialize, Serialize};

/// Result category of one check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// No findings
    Passed,
    /// Findings that do not count against the response
    Warned,
    /// Findings that count against the response
    Failed,
}

/// Outcome of one check on one payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check name
    pub check: String,
    pub status: CheckStatus,
    /// Human-readable findings
    pub findings: Vec<String>,
}

impl CheckOutcome {
    /// Clean outcome.
    pub fn passed(check: &str) -> Self {
        Self {
            check: check.to_string(),
            status: CheckStatus::Passed,
            findings: Vec::new(),
        }
    }

    /// Failed if `errors` is non-empty.
    pub fn from_errors(check: &str, errors: Vec<String>) -> Self {
        Self {
            check: check.to_string(),
            status: if errors.is_empty() {
                CheckStatus::Passed
            } else {
                CheckStatus::Failed
            },
            findings: errors,
        }
    }

    /// Warned if `warnings` is non-empty.
    pub fn from_warnings(check: &str, warnings: Vec<String>) -> Self {
        Self {
            check: check.to_string(),
            status: if warnings.is_empty() {
                CheckStatus::Passed
            } else {
                CheckStatus::Warned
            },
            findings: warnings,
        }
    }

    /// Whether the check counts as passed for scoring.
    pub fn counts_as_passed(&self) -> bool {
        self.status != CheckStatus::Failed
    }
}

/// A single validation rule over response content.
pub trait ResponseCheck: Send + Sync {
    /// Stable check name, reported in `ValidationReport::rules`.
    fn name(&self) -> &str;

    /// Whether a failure excludes the response regardless of score.
    fn gating(&self) -> bool {
        false
    }

    /// Run the check.
    fn check(&self, content: &Payload) -> CheckOutcome;
}
