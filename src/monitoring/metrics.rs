//! Pipeline metrics.
//!
//! Lock-free counters for the hot path, with a serializable snapshot for
//! reporting.

use crate::model::{ConsensusResult, DecisionType, ReasonCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by amount.
    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    /// Get current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A floating point sum.
#[derive(Debug, Default)]
pub struct Sum {
    bits: AtomicU64, // f64 bits
}

impl Sum {
    /// Add to the sum.
    pub fn add(&self, amount: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + amount).to_bits())
            });
    }

    /// Current value.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Point-in-time view of the pipeline counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests received
    pub total_requests: u64,
    /// Results with an accepted answer
    pub accepted: u64,
    /// Results without an accepted answer
    pub rejected: u64,
    /// Requests stopped by the policy gate
    pub policy_rejections: u64,
    /// Accepted results that came from a fallback path
    pub fallbacks: u64,
    /// Results per decision type
    pub decisions: BTreeMap<String, u64>,
    /// Mean fan-out wall time
    pub average_dispatch_ms: f64,
    /// Summed engine cost
    pub total_cost: f64,
}

impl MetricsSnapshot {
    /// Accepted share of all finished requests.
    pub fn acceptance_rate(&self) -> f64 {
        let finished = self.accepted + self.rejected;
        if finished == 0 {
            0.0
        } else {
            self.accepted as f64 / finished as f64
        }
    }
}

/// Counters for one pipeline.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    total_requests: Counter,
    accepted: Counter,
    rejected: Counter,
    policy_rejections: Counter,
    fallbacks: Counter,
    dispatches: Counter,
    dispatch_ms: Counter,
    total_cost: Sum,
    decisions: Mutex<HashMap<DecisionType, u64>>,
}

impl PipelineMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an incoming request.
    pub fn record_request(&self) {
        self.total_requests.inc();
    }

    /// Record one fan-out.
    pub fn record_dispatch(&self, elapsed_ms: u64, cost: f64) {
        self.dispatches.inc();
        self.dispatch_ms.add(elapsed_ms);
        self.total_cost.add(cost);
    }

    /// Record a finished result.
    pub fn record_result(&self, result: &ConsensusResult) {
        if result.accepted {
            self.accepted.inc();
        } else {
            self.rejected.inc();
        }
        if result.proof.reason_code == Some(ReasonCode::PolicyViolation) {
            self.policy_rejections.inc();
        }
        if result.fallback_used {
            self.fallbacks.inc();
        }
        if let Some(decision_type) = result.decision_type() {
            let mut decisions = self
                .decisions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *decisions.entry(decision_type).or_insert(0) += 1;
        }
    }

    /// Current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let dispatches = self.dispatches.get();
        let average_dispatch_ms = if dispatches == 0 {
            0.0
        } else {
            self.dispatch_ms.get() as f64 / dispatches as f64
        };
        let decisions = self
            .decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(t, n)| (t.as_str().to_string(), *n))
            .collect();

        MetricsSnapshot {
            total_requests: self.total_requests.get(),
            accepted: self.accepted.get(),
            rejected: self.rejected.get(),
            policy_rejections: self.policy_rejections.get(),
            fallbacks: self.fallbacks.get(),
            decisions,
            average_dispatch_ms,
            total_cost: self.total_cost.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecisionProof, Payload};

    fn accepted(decision_type: DecisionType) -> ConsensusResult {
        let proof = DecisionProof {
            decision_type: Some(decision_type),
            ..DecisionProof::default()
        };
        ConsensusResult::accepted("engine_a", Payload::text("X", "m"), proof, "ok".into())
    }

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        counter.inc();
        counter.add(4);
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn test_sum() {
        let sum = Sum::default();
        sum.add(0.25);
        sum.add(0.5);
        assert!((sum.get() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_record_results() {
        let metrics = PipelineMetrics::new();
        for _ in 0..3 {
            metrics.record_request();
        }
        metrics.record_result(&accepted(DecisionType::Quorum));
        metrics.record_result(&accepted(DecisionType::Tiebreaker));
        metrics.record_result(&ConsensusResult::rejected(
            ReasonCode::PolicyViolation,
            "blocked".into(),
            DecisionProof::default(),
        ));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.accepted, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.policy_rejections, 1);
        assert_eq!(snapshot.fallbacks, 1);
        assert_eq!(snapshot.decisions.get("quorum"), Some(&1));
        assert_eq!(snapshot.decisions.get("tiebreaker"), Some(&1));
        assert!((snapshot.acceptance_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_dispatch() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot().average_dispatch_ms, 0.0);
        metrics.record_dispatch(100, 0.01);
        metrics.record_dispatch(300, 0.02);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.average_dispatch_ms, 200.0);
        assert!((snapshot.total_cost - 0.03).abs() < 1e-9);
    }
}
