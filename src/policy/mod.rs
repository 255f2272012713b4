//! Policy Module
//!
//! Pre-dispatch admission:
//! - `GenerationIntent` derived from each request
//! - `PolicyGate` seam
//! - Rule-based `GuardrailGate`

pub mod gate;
pub mod guardrails;
pub mod intent;

pub use gate::{AllowAll, PolicyDecision, PolicyGate};
pub use guardrails::{
    Condition, GuardrailAction, GuardrailGate, GuardrailRule, GuardrailStats, Operator, RuleType,
    ViolationRecord,
};
pub use intent::{GenerationIntent, GENERATE_KIND};
