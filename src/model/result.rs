//! Consensus decision and its proof.

use crate::core::{Result, Timestamp};
use crate::model::payload::Payload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How an accepted answer was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    /// Exactly one agreeing group
    Quorum,
    /// Several agreeing groups, resolved by engine priority
    PriorityResolvedQuorum,
    /// No agreement, the tiebreaker named a candidate
    Tiebreaker,
    /// No agreement and no usable tiebreaker verdict
    PriorityFallback,
    /// Nothing could be selected
    TotalFailure,
}

impl DecisionType {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Quorum => "quorum",
            DecisionType::PriorityResolvedQuorum => "priority_resolved_quorum",
            DecisionType::Tiebreaker => "tiebreaker",
            DecisionType::PriorityFallback => "priority_fallback",
            DecisionType::TotalFailure => "total_failure",
        }
    }

    /// Whether the decision counts as a fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            DecisionType::PriorityResolvedQuorum
                | DecisionType::Tiebreaker
                | DecisionType::PriorityFallback
        )
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable reason for an unaccepted result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Rejected by the policy gate before dispatch
    PolicyViolation,
    /// Fewer than two responses qualified
    InsufficientResponses,
    /// No candidate could be selected
    TotalFailure,
}

impl ReasonCode {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::PolicyViolation => "policy_violation",
            ReasonCode::InsufficientResponses => "insufficient_responses",
            ReasonCode::TotalFailure => "total_failure",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One engine as seen by the decision procedure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsideredEngine {
    /// Engine id
    pub engine: String,
    /// Content digest (or sentinel marker)
    pub digest: String,
    /// Call latency
    pub latency_ms: u64,
    /// Validation score, absent for sentinels
    pub score: Option<f64>,
    /// Whether it took part in grouping
    pub qualified: bool,
    /// Sentinel error kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Details on the selected representative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WinnerSelection {
    /// Engine id
    pub engine: String,
    /// Call latency
    pub latency_ms: u64,
    /// Call cost
    pub cost: f64,
    /// Validation score
    pub validation_score: f64,
    /// Rule that picked it among its peers
    pub selection_reason: String,
}

/// What the tiebreaker was asked and answered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TiebreakRecord {
    /// Tiebreaker engine id
    pub engine: String,
    /// Correlation id of the subordinate call
    pub correlation_id: String,
    /// Raw decision text
    pub decision: String,
}

/// A response left out of grouping, reported only with diagnostics enabled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExcludedCandidate {
    /// Engine id
    pub engine: String,
    /// Validation score
    pub score: f64,
    /// Validation errors
    pub errors: Vec<String>,
}

/// Signature over the canonical serialization of a result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Signature algorithm
    pub algorithm: String,
    /// Base64 signature
    pub signature: String,
    /// Hex SHA3-256 of the signed bytes
    pub object_hash: String,
    /// Signing time
    pub timestamp: Timestamp,
    /// Hex public key
    pub public_key: String,
}

/// Audit record explaining why an answer was chosen.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionProof {
    /// Decision type, absent for early rejections
    pub decision_type: Option<DecisionType>,
    /// Reason code for unaccepted results
    pub reason_code: Option<ReasonCode>,
    /// Every engine response considered
    pub considered: Vec<ConsideredEngine>,
    /// Digest shared by the agreeing group
    pub consensus_hash: Option<String>,
    /// Engines in the selected group (or the single chosen engine)
    pub agreeing_engines: Vec<String>,
    /// Digests of the agreeing engines
    pub agreeing_hashes: Vec<String>,
    /// Size of the agreeing group
    pub agreement_count: usize,
    /// Selected engine
    pub chosen_engine: Option<String>,
    /// Selected engine's digest
    pub chosen_hash: Option<String>,
    /// Priority rank used for resolution (0 = highest)
    pub priority_rank: Option<usize>,
    /// Tiebreaker call, when one was made and answered
    pub tiebreaker: Option<TiebreakRecord>,
    /// Why a fallback was taken
    pub fallback_reason: Option<String>,
    /// Representative details
    pub winner_selection: Option<WinnerSelection>,
    /// Pipeline trace id
    pub trace_id: Option<String>,
    /// Engines the request was dispatched to
    pub engines_used: Vec<String>,
    /// Validation score per validated engine
    pub validation_scores: BTreeMap<String, f64>,
    /// Excluded candidates (diagnostics only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ExcludedCandidate>,
    /// Seal over the result
    pub signature: Option<SignatureEnvelope>,
}

/// Terminal artifact of one pipeline invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Whether an answer was accepted
    pub accepted: bool,
    /// Winning engine id
    pub winner_engine: Option<String>,
    /// Accepted content plus selection metadata
    pub merged_content: Option<Payload>,
    /// Decision proof
    pub proof: DecisionProof,
    /// Human-readable reason
    pub reason: String,
    /// Whether the answer came from a fallback path
    pub fallback_used: bool,
}

impl ConsensusResult {
    /// Create an accepted result.
    pub fn accepted(
        winner: &str,
        merged_content: Payload,
        proof: DecisionProof,
        reason: String,
    ) -> Self {
        let fallback_used = proof.decision_type.is_some_and(|t| t.is_fallback());
        Self {
            accepted: true,
            winner_engine: Some(winner.to_string()),
            merged_content: Some(merged_content),
            proof,
            reason,
            fallback_used,
        }
    }

    /// Create an unaccepted result.
    pub fn rejected(code: ReasonCode, reason: String, mut proof: DecisionProof) -> Self {
        proof.reason_code = Some(code);
        Self {
            accepted: false,
            winner_engine: None,
            merged_content: None,
            proof,
            reason,
            fallback_used: false,
        }
    }

    /// Decision type shortcut.
    pub fn decision_type(&self) -> Option<DecisionType> {
        self.proof.decision_type
    }

    /// Canonical JSON value of the result without its signature.
    pub fn signable_value(&self) -> Result<serde_json::Value> {
        let mut unsigned = self.clone();
        unsigned.proof.signature = None;
        Ok(serde_json::to_value(&unsigned)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_type_names() {
        assert_eq!(DecisionType::Quorum.as_str(), "quorum");
        assert_eq!(
            serde_json::to_value(DecisionType::PriorityResolvedQuorum).unwrap(),
            serde_json::json!("priority_resolved_quorum")
        );
        assert!(DecisionType::Tiebreaker.is_fallback());
        assert!(DecisionType::PriorityResolvedQuorum.is_fallback());
        assert!(!DecisionType::Quorum.is_fallback());
    }

    #[test]
    fn test_accepted_sets_fallback_flag() {
        let proof = DecisionProof {
            decision_type: Some(DecisionType::PriorityFallback),
            ..Default::default()
        };
        let result = ConsensusResult::accepted("engine_a", Payload::new(), proof, "r".into());
        assert!(result.accepted);
        assert!(result.fallback_used);
        assert_eq!(result.winner_engine.as_deref(), Some("engine_a"));
    }

    #[test]
    fn test_rejected_records_code() {
        let result = ConsensusResult::rejected(
            ReasonCode::PolicyViolation,
            "blocked".into(),
            DecisionProof::default(),
        );
        assert!(!result.accepted);
        assert!(result.decision_type().is_none());
        assert_eq!(result.proof.reason_code, Some(ReasonCode::PolicyViolation));
    }

    #[test]
    fn test_signable_value_drops_signature() {
        let mut result = ConsensusResult::rejected(
            ReasonCode::TotalFailure,
            "x".into(),
            DecisionProof::default(),
        );
        result.proof.signature = Some(SignatureEnvelope {
            algorithm: "Ed25519".into(),
            signature: "sig".into(),
            object_hash: "hash".into(),
            timestamp: crate::core::now(),
            public_key: "pk".into(),
        });
        let value = result.signable_value().unwrap();
        assert!(value["proof"]["signature"].is_null());
    }
}
