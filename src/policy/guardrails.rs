//! Rule-based admission guardrails.
//!
//! Each rule is a conjunction of conditions over the intent context. A rule
//! whose conditions all hold triggers its action; the highest-severity
//! triggered rule decides the outcome.

use crate::core::{now, Timestamp};
use crate::engine::filters::DEFAULT_JAILBREAK_PHRASES;
use crate::policy::gate::{PolicyDecision, PolicyGate};
use crate::policy::intent::GenerationIntent;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Comparison applied by a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    /// Case-insensitive substring match
    Contains,
}

/// Kind of concern a rule guards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Risk indicators above threshold
    Risk,
    /// Malformed or empty intents
    Integrity,
    /// Prompt injection attempts
    Injection,
}

impl RuleType {
    fn as_str(&self) -> &'static str {
        match self {
            RuleType::Risk => "RISK",
            RuleType::Integrity => "INTEGRITY",
            RuleType::Injection => "INJECTION",
        }
    }
}

/// Action taken when a rule triggers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailAction {
    /// Admit and log
    Warn,
    /// Block dispatch
    Reject,
}

/// A condition for a guardrail rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Condition {
    /// Context field to check
    pub field: String,
    pub operator: Operator,
    /// Value to compare
    pub value: Value,
}

impl Condition {
    /// Create a new condition.
    pub fn new(field: &str, operator: Operator, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    /// Evaluate against a context. Missing fields never match.
    pub fn evaluate(&self, context: &HashMap<String, Value>) -> bool {
        let Some(actual) = context.get(&self.field) else {
            return false;
        };

        match self.operator {
            Operator::Eq => actual == &self.value,
            Operator::Ne => actual != &self.value,
            Operator::Gt => match (actual.as_f64(), self.value.as_f64()) {
                (Some(a), Some(b)) => a > b,
                _ => false,
            },
            Operator::Lt => match (actual.as_f64(), self.value.as_f64()) {
                (Some(a), Some(b)) => a < b,
                _ => false,
            },
            Operator::Contains => match (actual.as_str(), self.value.as_str()) {
                (Some(a), Some(b)) => a.to_lowercase().contains(&b.to_lowercase()),
                _ => false,
            },
        }
    }
}

/// A guardrail rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuardrailRule {
    pub rule_id: String,
    pub rule_type: RuleType,
    /// All must hold for the rule to trigger
    pub conditions: Vec<Condition>,
    pub action: GuardrailAction,
    pub description: String,
    /// Severity (1-10)
    pub severity: u8,
}

impl GuardrailRule {
    /// Create a new rule.
    pub fn new(rule_id: &str, rule_type: RuleType, action: GuardrailAction, description: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_type,
            conditions: Vec::new(),
            action,
            description: description.to_string(),
            severity: 5,
        }
    }

    /// Add a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set severity.
    pub fn with_severity(mut self, severity: u8) -> Self {
        self.severity = severity.clamp(1, 10);
        self
    }

    /// Whether every condition holds.
    pub fn is_triggered(&self, context: &HashMap<String, Value>) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.evaluate(context))
    }
}

/// Record of a triggered rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub rule_id: String,
    pub intent_id: String,
    pub timestamp: Timestamp,
    pub action_taken: GuardrailAction,
}

/// Counters for the gate.
#[derive(Clone, Debug, Default)]
pub struct GuardrailStats {
    pub total_evaluations: u64,
    pub rejections: u64,
    pub violations_by_type: HashMap<RuleType, u64>,
}

#[derive(Default)]
struct GuardrailState {
    stats: GuardrailStats,
    violations: Vec<ViolationRecord>,
}

/// Policy gate backed by guardrail rules.
pub struct GuardrailGate {
    rules: Vec<GuardrailRule>,
    max_log: usize,
    state: Mutex<GuardrailState>,
}

impl GuardrailGate {
    /// Gate with no rules.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            max_log: 1000,
            state: Mutex::new(GuardrailState::default()),
        }
    }

    /// Gate with the standard rule set.
    pub fn with_defaults() -> Self {
        let mut gate = Self::new();

        gate.add_rule(
            GuardrailRule::new(
                "risk-1",
                RuleType::Risk,
                GuardrailAction::Reject,
                "Risk level above admission threshold",
            )
            .with_condition(Condition::new("risk_level", Operator::Gt, json!(0.8)))
            .with_severity(9),
        );

        gate.add_rule(
            GuardrailRule::new(
                "integrity-1",
                RuleType::Integrity,
                GuardrailAction::Reject,
                "Empty prompt template",
            )
            .with_condition(Condition::new("template_length", Operator::Eq, json!(0)))
            .with_severity(8),
        );

        gate.add_rule(
            GuardrailRule::new(
                "integrity-2",
                RuleType::Integrity,
                GuardrailAction::Reject,
                "Unsupported intent kind",
            )
            .with_condition(Condition::new(
                "kind",
                Operator::Ne,
                json!(crate::policy::intent::GENERATE_KIND),
            ))
            .with_severity(8),
        );

        for (i, phrase) in DEFAULT_JAILBREAK_PHRASES.iter().enumerate() {
            gate.add_rule(
                GuardrailRule::new(
                    &format!("injection-{}", i + 1),
                    RuleType::Injection,
                    GuardrailAction::Reject,
                    &format!("Template contains \"{}\"", phrase),
                )
                .with_condition(Condition::new("template", Operator::Contains, json!(phrase)))
                .with_severity(10),
            );
        }

        gate
    }

    /// Bound the violation log.
    pub fn with_max_log(mut self, max_log: usize) -> Self {
        self.max_log = max_log.max(1);
        self
    }

    /// Add a rule.
    pub fn add_rule(&mut self, rule: GuardrailRule) {
        self.rules.push(rule);
    }

    /// Remove a rule by id.
    pub fn remove_rule(&mut self, rule_id: &str) {
        self.rules.retain(|r| r.rule_id != rule_id);
    }

    /// Active rules.
    pub fn rules(&self) -> &[GuardrailRule] {
        &self.rules
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> GuardrailStats {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .clone()
    }

    /// Snapshot of the violation log.
    pub fn violations(&self) -> Vec<ViolationRecord> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .violations
            .clone()
    }
}

impl Default for GuardrailGate {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PolicyGate for GuardrailGate {
    fn evaluate(&self, intent: &GenerationIntent) -> PolicyDecision {
        let context = intent.context();
        let triggered: Vec<&GuardrailRule> =
            self.rules.iter().filter(|r| r.is_triggered(&context)).collect();

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.stats.total_evaluations += 1;
        for rule in &triggered {
            *state
                .stats
                .violations_by_type
                .entry(rule.rule_type.clone())
                .or_insert(0) += 1;
            state.violations.push(ViolationRecord {
                rule_id: rule.rule_id.clone(),
                intent_id: intent.id.clone(),
                timestamp: now(),
                action_taken: rule.action.clone(),
            });
        }
        let overflow = state.violations.len().saturating_sub(self.max_log);
        if overflow > 0 {
            state.violations.drain(..overflow);
        }

        let rule_ids: Vec<String> = triggered.iter().map(|r| r.rule_id.clone()).collect();
        let blocking = triggered
            .iter()
            .filter(|r| r.action == GuardrailAction::Reject)
            .max_by_key(|r| r.severity);

        match blocking {
            Some(rule) => {
                state.stats.rejections += 1;
                tracing::warn!(
                    intent = %intent.id,
                    rule = %rule.rule_id,
                    "policy gate rejected intent"
                );
                PolicyDecision::reject(&format!(
                    "[{}] {}: {}",
                    rule.rule_type.as_str(),
                    rule.rule_id,
                    rule.description
                ))
                .with_rules(rule_ids)
            }
            None => {
                if !rule_ids.is_empty() {
                    tracing::info!(intent = %intent.id, rules = ?rule_ids, "policy gate warnings");
                }
                PolicyDecision::allow().with_rules(rule_ids)
            }
        }
    }
}
