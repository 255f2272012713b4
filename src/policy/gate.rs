//! PolicyGate trait definition.

use crate::policy::intent::GenerationIntent;
use serde::{Deserialize, Serialize};

/// Admission decision for one intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether dispatch may proceed
    pub allowed: bool,
    /// Rejection reason
    pub reason: Option<String>,
    /// Ids of the rules that triggered
    pub triggered_rules: Vec<String>,
}

impl PolicyDecision {
    /// Allow the intent.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            triggered_rules: Vec::new(),
        }
    }

    /// Reject the intent.
    pub fn reject(reason: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
            triggered_rules: Vec::new(),
        }
    }

    /// Attach triggered rule ids.
    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.triggered_rules = rules;
        self
    }
}

/// Pre-dispatch admission check.
pub trait PolicyGate: Send + Sync {
    /// Decide whether the intent may be dispatched.
    fn evaluate(&self, intent: &GenerationIntent) -> PolicyDecision;
}

/// Gate that admits everything.
#[derive(Clone, Debug, Default)]
pub struct AllowAll;

impl PolicyGate for AllowAll {
    fn evaluate(&self, _intent: &GenerationIntent) -> PolicyDecision {
        PolicyDecision::allow()
    }
}
