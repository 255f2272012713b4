//! Consensus decision procedure.
//!
//! Given every engine's response and validation report, picks one answer:
//! - a single quorum group wins outright
//! - several quorum groups are resolved by engine priority
//! - no quorum group goes to the tiebreaker, then to a score/priority fallback
//!
//! Nothing here returns an error; every path ends in a `ConsensusResult`
//! whose proof explains it.

use crate::consensus::priority::EnginePriority;
use crate::consensus::quorum::QuorumRule;
use crate::consensus::tiebreak::{
    parse_choice, CandidateSummary, TiebreakRequest, Tiebreaker, PREVIEW_CHARS,
};
use crate::core::{Error, Hash256, Result};
use crate::model::{
    ConsensusResult, ConsideredEngine, DecisionProof, DecisionType, EngineResponse,
    ExcludedCandidate, ReasonCode, TiebreakRecord, ValidationReport, WinnerSelection,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default minimum validation score.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 70.0;

/// Consensus configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Minimum validation score (0-100) to take part in grouping
    pub acceptance_threshold: f64,
    /// Quorum group size rule
    pub quorum: QuorumRule,
    /// Engine priority, highest first
    pub priority: EnginePriority,
    /// Bound on the tiebreaker call
    pub tiebreaker_timeout_ms: u64,
    /// Report excluded candidates in the proof
    pub diagnostics: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            quorum: QuorumRule::default(),
            priority: EnginePriority::default(),
            tiebreaker_timeout_ms: 30_000,
            diagnostics: false,
        }
    }
}

impl ConsensusConfig {
    /// Tiebreaker timeout.
    pub fn tiebreaker_timeout(&self) -> Duration {
        Duration::from_millis(self.tiebreaker_timeout_ms)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.acceptance_threshold) {
            return Err(Error::InvalidConfig(format!(
                "acceptance_threshold must be within 0-100, got {}",
                self.acceptance_threshold
            )));
        }
        if self.tiebreaker_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "tiebreaker_timeout_ms must be greater than zero".into(),
            ));
        }
        self.quorum.validate()
    }

    /// Check ranges and that `engines` configured engines can reach a quorum.
    pub fn validate_for(&self, engines: usize) -> Result<()> {
        self.validate()?;
        let required = self.quorum.required(engines);
        if required > engines {
            return Err(Error::InvalidConfig(format!(
                "quorum rule ({}) needs {} agreeing engines but only {} are configured",
                self.quorum, required, engines
            )));
        }
        Ok(())
    }
}

/// One engine's response with its validation report.
///
/// Sentinels carry no report.
#[derive(Clone, Debug)]
pub struct Ballot {
    pub response: EngineResponse,
    pub report: Option<ValidationReport>,
}

impl Ballot {
    /// Validated response.
    pub fn validated(response: EngineResponse, report: ValidationReport) -> Self {
        Self {
            response,
            report: Some(report),
        }
    }

    /// Response without a report.
    pub fn unvalidated(response: EngineResponse) -> Self {
        Self {
            response,
            report: None,
        }
    }
}

/// A qualifying response.
struct Candidate<'a> {
    response: &'a EngineResponse,
    hash: Hash256,
    score: f64,
}

impl Candidate<'_> {
    fn engine(&self) -> &str {
        &self.response.engine
    }

    fn winner_selection(&self, reason: &str) -> WinnerSelection {
        WinnerSelection {
            engine: self.response.engine.clone(),
            latency_ms: self.response.latency_ms,
            cost: self.response.cost,
            validation_score: self.score,
            selection_reason: reason.to_string(),
        }
    }

    fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            engine: self.response.engine.clone(),
            content_preview: self.response.content.preview(PREVIEW_CHARS),
            validation_score: self.score,
            latency_ms: self.response.latency_ms,
            cost: self.response.cost,
        }
    }
}

/// Consensus engine.
pub struct ConsensusEngine {
    config: ConsensusConfig,
    tiebreaker: Option<Arc<dyn Tiebreaker>>,
}

impl ConsensusEngine {
    /// Create without a tiebreaker.
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            config,
            tiebreaker: None,
        }
    }

    /// Attach a tiebreaker.
    pub fn with_tiebreaker(mut self, tiebreaker: Arc<dyn Tiebreaker>) -> Self {
        self.tiebreaker = Some(tiebreaker);
        self
    }

    /// Configuration.
    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Decide on an answer from all ballots of one request.
    pub async fn decide(&self, ballots: &[Ballot]) -> ConsensusResult {
        let threshold = self.config.acceptance_threshold;
        let mut proof = self.base_proof(ballots);

        let candidates: Vec<Candidate<'_>> = ballots
            .iter()
            .filter_map(|ballot| {
                let report = ballot.report.as_ref()?;
                let hash = *ballot.response.digest.hash()?;
                report.qualifies(threshold).then_some(Candidate {
                    response: &ballot.response,
                    hash,
                    score: report.score,
                })
            })
            .collect();

        if candidates.len() < 2 {
            let validated = ballots.iter().filter(|b| b.report.is_some()).count();
            let reason = if validated > candidates.len() {
                format!(
                    "insufficient_responses: {} of {} responses met the validation threshold of {}",
                    candidates.len(),
                    ballots.len(),
                    threshold
                )
            } else {
                format!(
                    "insufficient_responses: only {} of {} engines returned usable responses",
                    candidates.len(),
                    ballots.len()
                )
            };
            warn!(qualifying = candidates.len(), "{}", reason);
            return ConsensusResult::rejected(ReasonCode::InsufficientResponses, reason, proof);
        }

        // BTreeMap keeps group iteration independent of arrival order.
        let mut groups: BTreeMap<Hash256, Vec<&Candidate<'_>>> = BTreeMap::new();
        for candidate in &candidates {
            groups.entry(candidate.hash).or_default().push(candidate);
        }

        let quorum = &self.config.quorum;
        let required = quorum.required(ballots.len());
        let quorum_groups: Vec<&Vec<&Candidate<'_>>> = groups
            .values()
            .filter(|g| quorum.is_satisfied(g.len(), ballots.len()))
            .collect();
        debug!(
            groups = groups.len(),
            quorum_groups = quorum_groups.len(),
            required,
            "grouped candidates"
        );

        match quorum_groups.len() {
            0 => self.break_tie(&candidates, proof).await,
            1 => self.accept_group(quorum_groups[0], DecisionType::Quorum, None, proof),
            n => {
                let priority = &self.config.priority;
                let best = quorum_groups
                    .iter()
                    .filter_map(|group| {
                        let top = priority.highest(group.iter().map(|c| c.engine()))?;
                        Some((top, *group))
                    })
                    .min_by(|(a, _), (b, _)| priority.compare(a, b));

                match best {
                    Some((top, group)) => {
                        let rank = priority.rank(top);
                        info!(
                            groups = n,
                            engine = top,
                            rank,
                            "resolving quorum groups by priority"
                        );
                        self.accept_group(
                            group,
                            DecisionType::PriorityResolvedQuorum,
                            Some(rank),
                            proof,
                        )
                    }
                    None => {
                        proof.decision_type = Some(DecisionType::TotalFailure);
                        ConsensusResult::rejected(
                            ReasonCode::TotalFailure,
                            "priority resolution failed".into(),
                            proof,
                        )
                    }
                }
            }
        }
    }

    fn base_proof(&self, ballots: &[Ballot]) -> DecisionProof {
        let threshold = self.config.acceptance_threshold;
        let mut proof = DecisionProof {
            engines_used: ballots.iter().map(|b| b.response.engine.clone()).collect(),
            ..DecisionProof::default()
        };

        for ballot in ballots {
            let response = &ballot.response;
            let qualified = !response.is_sentinel()
                && ballot.report.as_ref().is_some_and(|r| r.qualifies(threshold));

            proof.considered.push(ConsideredEngine {
                engine: response.engine.clone(),
                digest: response.digest.to_string(),
                latency_ms: response.latency_ms,
                score: ballot.report.as_ref().map(|r| r.score),
                qualified,
                error: response.error_kind().map(|k| k.to_string()),
            });

            if let Some(report) = &ballot.report {
                proof
                    .validation_scores
                    .insert(response.engine.clone(), report.score);
                if self.config.diagnostics && !qualified {
                    proof.diagnostics.push(ExcludedCandidate {
                        engine: response.engine.clone(),
                        score: report.score,
                        errors: report.errors.clone(),
                    });
                }
            }
        }
        proof
    }

    fn accept_group(
        &self,
        group: &[&Candidate<'_>],
        decision_type: DecisionType,
        priority_rank: Option<usize>,
        mut proof: DecisionProof,
    ) -> ConsensusResult {
        let representative = group
            .iter()
            .min_by(|a, b| {
                a.response
                    .latency_ms
                    .cmp(&b.response.latency_ms)
                    .then_with(|| a.engine().cmp(b.engine()))
            })
            .copied();
        let Some(representative) = representative else {
            proof.decision_type = Some(DecisionType::TotalFailure);
            return ConsensusResult::rejected(ReasonCode::TotalFailure, "empty group".into(), proof);
        };

        let consensus_hash = representative.hash.to_hex();
        let agreeing_engines: Vec<String> = group.iter().map(|c| c.engine().to_string()).collect();

        proof.decision_type = Some(decision_type);
        proof.consensus_hash = Some(consensus_hash.clone());
        proof.agreeing_engines = agreeing_engines.clone();
        proof.agreeing_hashes = group.iter().map(|c| c.hash.to_hex()).collect();
        proof.agreement_count = group.len();
        proof.chosen_engine = Some(representative.engine().to_string());
        proof.chosen_hash = Some(consensus_hash.clone());
        proof.priority_rank = priority_rank;
        proof.winner_selection = Some(representative.winner_selection("lowest_latency"));

        let merged = representative.response.content.clone().with(
            "consensus_metadata",
            json!({
                "consensus_hash": consensus_hash,
                "agreeing_engines": agreeing_engines,
                "agreement_count": group.len(),
                "decision_type": decision_type.as_str(),
                "selected_engine": representative.engine(),
                "selection_reason": "lowest_latency",
            }),
        );

        let reason = match priority_rank {
            Some(rank) => format!(
                "quorum groups resolved by engine priority (rank {}), {} agreeing engines",
                rank,
                group.len()
            ),
            None => format!("quorum reached with {} agreeing engines", group.len()),
        };
        info!(
            engine = representative.engine(),
            decision = decision_type.as_str(),
            agreement = group.len(),
            "consensus accepted"
        );
        ConsensusResult::accepted(representative.engine(), merged, proof, reason)
    }

    async fn break_tie(
        &self,
        candidates: &[Candidate<'_>],
        mut proof: DecisionProof,
    ) -> ConsensusResult {
        let Some(tiebreaker) = &self.tiebreaker else {
            return self.priority_fallback(candidates, proof, "no_tiebreaker_configured");
        };

        let request = TiebreakRequest::new(candidates.iter().map(Candidate::summary).collect());
        let timeout = self.config.tiebreaker_timeout();
        info!(
            tiebreaker = tiebreaker.id(),
            correlation_id = %request.correlation_id,
            candidates = candidates.len(),
            "no quorum, consulting tiebreaker"
        );

        let verdict = match tokio::time::timeout(timeout, tiebreaker.choose(&request)).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                warn!(error = %e, "tiebreaker failed");
                let reason = format!("tiebreaker_error: {}", e);
                return self.priority_fallback(candidates, proof, &reason);
            }
            Err(_) => {
                let e = Error::TiebreakerTimeout(timeout.as_millis() as u64);
                warn!(error = %e, "tiebreaker timed out");
                return self.priority_fallback(candidates, proof, &e.to_string());
            }
        };

        proof.tiebreaker = Some(TiebreakRecord {
            engine: verdict.tiebreaker.clone(),
            correlation_id: request.correlation_id.clone(),
            decision: verdict.decision.clone(),
        });

        let ids = request.engine_ids();
        let chosen = parse_choice(&verdict.decision, &ids)
            .and_then(|engine| candidates.iter().find(|c| c.engine() == engine));
        let Some(chosen) = chosen else {
            warn!(decision = %verdict.decision, "tiebreaker named no candidate");
            return self.priority_fallback(candidates, proof, "unparseable_tiebreaker_decision");
        };

        let hash = chosen.hash.to_hex();
        proof.decision_type = Some(DecisionType::Tiebreaker);
        proof.chosen_engine = Some(chosen.engine().to_string());
        proof.chosen_hash = Some(hash.clone());
        proof.agreeing_engines = vec![chosen.engine().to_string()];
        proof.agreeing_hashes = vec![hash];
        proof.agreement_count = 1;
        proof.winner_selection = Some(chosen.winner_selection("tiebreaker_decision"));

        let merged = chosen.response.content.clone().with(
            "tiebreaker_metadata",
            json!({
                "tiebreaker_used": true,
                "tiebreaker_engine": verdict.tiebreaker,
                "chosen_engine": chosen.engine(),
                "correlation_id": request.correlation_id,
                "tiebreaker_reasoning": verdict.decision,
            }),
        );

        info!(engine = chosen.engine(), "tiebreaker selected candidate");
        let reason = format!("tiebreaker selected {}", chosen.engine());
        ConsensusResult::accepted(chosen.engine(), merged, proof, reason)
    }

    fn priority_fallback(
        &self,
        candidates: &[Candidate<'_>],
        mut proof: DecisionProof,
        fallback_reason: &str,
    ) -> ConsensusResult {
        let priority = &self.config.priority;
        let best = candidates.iter().min_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| priority.compare(a.engine(), b.engine()))
        });

        let Some(best) = best else {
            proof.decision_type = Some(DecisionType::TotalFailure);
            proof.fallback_reason = Some(fallback_reason.to_string());
            return ConsensusResult::rejected(
                ReasonCode::TotalFailure,
                "all consensus mechanisms failed".into(),
                proof,
            );
        };

        let rank = priority.rank(best.engine());
        let hash = best.hash.to_hex();
        proof.decision_type = Some(DecisionType::PriorityFallback);
        proof.fallback_reason = Some(fallback_reason.to_string());
        proof.chosen_engine = Some(best.engine().to_string());
        proof.chosen_hash = Some(hash.clone());
        proof.agreeing_engines = vec![best.engine().to_string()];
        proof.agreeing_hashes = vec![hash];
        proof.agreement_count = 1;
        proof.priority_rank = Some(rank);
        proof.winner_selection = Some(best.winner_selection("validation_score_then_priority"));

        let merged = best.response.content.clone().with(
            "fallback_metadata",
            json!({
                "fallback_reason": fallback_reason,
                "selected_by": "validation_score_then_priority",
                "priority_rank": rank,
                "validation_score": best.score,
            }),
        );

        warn!(engine = best.engine(), reason = fallback_reason, "priority fallback");
        let reason = format!(
            "priority fallback selected {} (score {}, rank {})",
            best.engine(),
            best.score,
            rank
        );
        ConsensusResult::accepted(best.engine(), merged, proof, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::tiebreak::TiebreakVerdict;
    use crate::model::{ErrorKind, Payload};
    use async_trait::async_trait;

    fn report(score: f64) -> ValidationReport {
        ValidationReport {
            schema_ok: true,
            rules: Vec::new(),
            score,
            errors: Vec::new(),
            warnings: Vec::new(),
            hard_failures: Vec::new(),
        }
    }

    fn ballot(engine: &str, text: &str, latency_ms: u64) -> Ballot {
        scored(engine, text, latency_ms, 100.0)
    }

    fn scored(engine: &str, text: &str, latency_ms: u64, score: f64) -> Ballot {
        Ballot::validated(
            EngineResponse::new(engine, Payload::text(text, "m")).with_latency(latency_ms),
            report(score),
        )
    }

    fn timeout(engine: &str) -> Ballot {
        Ballot::unvalidated(EngineResponse::sentinel(engine, ErrorKind::Timeout, 30_000))
    }

    struct FixedTiebreaker(&'static str);

    #[async_trait]
    impl Tiebreaker for FixedTiebreaker {
        fn id(&self) -> &str {
            "tiebreaker"
        }

        async fn choose(&self, _request: &TiebreakRequest) -> Result<TiebreakVerdict> {
            Ok(TiebreakVerdict {
                tiebreaker: "tiebreaker".into(),
                decision: self.0.to_string(),
            })
        }
    }

    struct FailingTiebreaker;

    #[async_trait]
    impl Tiebreaker for FailingTiebreaker {
        fn id(&self) -> &str {
            "tiebreaker"
        }

        async fn choose(&self, _request: &TiebreakRequest) -> Result<TiebreakVerdict> {
            Err(Error::Tiebreaker("offline".into()))
        }
    }

    struct SlowTiebreaker;

    #[async_trait]
    impl Tiebreaker for SlowTiebreaker {
        fn id(&self) -> &str {
            "tiebreaker"
        }

        async fn choose(&self, _request: &TiebreakRequest) -> Result<TiebreakVerdict> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(Error::Internal("unreachable".into()))
        }
    }

    fn engine() -> ConsensusEngine {
        ConsensusEngine::new(ConsensusConfig::default())
    }

    #[tokio::test]
    async fn test_unanimous_quorum() {
        let result = engine()
            .decide(&[
                ballot("engine_a", "X", 30),
                ballot("engine_b", "X", 10),
                ballot("engine_c", "X", 20),
            ])
            .await;

        assert!(result.accepted);
        assert_eq!(result.decision_type(), Some(DecisionType::Quorum));
        assert_eq!(result.winner_engine.as_deref(), Some("engine_b"));
        assert_eq!(result.proof.agreement_count, 3);
        assert!(!result.fallback_used);
        let merged = result.merged_content.unwrap();
        assert_eq!(merged.response_text(), Some("X"));
        assert_eq!(merged.get("consensus_metadata").unwrap()["selected_engine"], "engine_b");
    }

    #[tokio::test]
    async fn test_two_of_three_with_timeout() {
        let result = engine()
            .decide(&[
                ballot("engine_a", "X", 40),
                ballot("engine_b", "X", 25),
                timeout("engine_c"),
            ])
            .await;

        assert!(result.accepted);
        assert_eq!(result.decision_type(), Some(DecisionType::Quorum));
        assert_eq!(result.winner_engine.as_deref(), Some("engine_b"));
        assert_eq!(result.proof.considered.len(), 3);
        assert_eq!(result.proof.considered[2].error.as_deref(), Some("timeout"));
        assert!(!result.proof.considered[2].qualified);
        assert_eq!(result.proof.agreeing_engines, vec!["engine_a", "engine_b"]);
    }

    #[tokio::test]
    async fn test_equal_latency_breaks_lexically() {
        let result = engine()
            .decide(&[ballot("engine_b", "X", 10), ballot("engine_a", "X", 10)])
            .await;
        assert_eq!(result.winner_engine.as_deref(), Some("engine_a"));
    }

    #[tokio::test]
    async fn test_no_false_quorum_between_sentinels() {
        let result = engine()
            .decide(&[timeout("engine_a"), timeout("engine_b"), ballot("engine_c", "X", 5)])
            .await;
        assert!(!result.accepted);
        assert_eq!(result.proof.reason_code, Some(ReasonCode::InsufficientResponses));
        assert_eq!(result.decision_type(), None);
    }

    #[tokio::test]
    async fn test_disagreement_with_tiebreaker() {
        let engine = engine().with_tiebreaker(Arc::new(FixedTiebreaker("I pick engine_c")));
        let result = engine
            .decide(&[
                ballot("engine_a", "X", 10),
                ballot("engine_b", "Y", 10),
                ballot("engine_c", "Z", 10),
            ])
            .await;

        assert!(result.accepted);
        assert_eq!(result.decision_type(), Some(DecisionType::Tiebreaker));
        assert_eq!(result.winner_engine.as_deref(), Some("engine_c"));
        assert!(result.fallback_used);
        let record = result.proof.tiebreaker.as_ref().unwrap();
        assert!(!record.correlation_id.is_empty());
        assert!(result
            .merged_content
            .unwrap()
            .contains_key("tiebreaker_metadata"));
    }

    #[tokio::test]
    async fn test_unparseable_verdict_falls_back_to_priority() {
        let engine = engine().with_tiebreaker(Arc::new(FixedTiebreaker("no idea")));
        let result = engine
            .decide(&[
                ballot("engine_c", "Z", 10),
                ballot("engine_b", "Y", 10),
                ballot("engine_a", "X", 10),
            ])
            .await;

        assert_eq!(result.decision_type(), Some(DecisionType::PriorityFallback));
        assert_eq!(result.winner_engine.as_deref(), Some("engine_a"));
        assert_eq!(result.proof.priority_rank, Some(0));
        assert!(result.fallback_used);
        assert!(result.proof.tiebreaker.is_some());
    }

    #[tokio::test]
    async fn test_fallback_prefers_higher_score() {
        let engine = engine().with_tiebreaker(Arc::new(FailingTiebreaker));
        let result = engine
            .decide(&[
                scored("engine_a", "X", 10, 75.0),
                scored("engine_b", "Y", 10, 100.0),
                scored("engine_c", "Z", 10, 100.0),
            ])
            .await;

        assert_eq!(result.decision_type(), Some(DecisionType::PriorityFallback));
        assert_eq!(result.winner_engine.as_deref(), Some("engine_b"));
        assert!(result
            .proof
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiebreaker_timeout_falls_back() {
        let config = ConsensusConfig {
            tiebreaker_timeout_ms: 100,
            ..ConsensusConfig::default()
        };
        let engine = ConsensusEngine::new(config).with_tiebreaker(Arc::new(SlowTiebreaker));
        let result = engine
            .decide(&[ballot("engine_a", "X", 10), ballot("engine_b", "Y", 10)])
            .await;

        assert_eq!(result.decision_type(), Some(DecisionType::PriorityFallback));
        assert_eq!(result.winner_engine.as_deref(), Some("engine_a"));
        assert!(result.proof.tiebreaker.is_none());
    }

    #[tokio::test]
    async fn test_no_tiebreaker_falls_back() {
        let result = engine()
            .decide(&[ballot("engine_b", "Y", 10), ballot("engine_c", "Z", 10)])
            .await;
        assert_eq!(result.decision_type(), Some(DecisionType::PriorityFallback));
        assert_eq!(result.winner_engine.as_deref(), Some("engine_b"));
        assert_eq!(
            result.proof.fallback_reason.as_deref(),
            Some("no_tiebreaker_configured")
        );
    }

    #[tokio::test]
    async fn test_multiple_quorum_groups_resolved_by_priority() {
        let config = ConsensusConfig {
            priority: EnginePriority::new(&["e1", "e2", "e3", "e4", "e5"]),
            ..ConsensusConfig::default()
        };
        let result = ConsensusEngine::new(config)
            .decide(&[
                ballot("e1", "X", 50),
                ballot("e2", "Y", 5),
                ballot("e3", "X", 40),
                ballot("e4", "Y", 1),
                ballot("e5", "Z", 1),
            ])
            .await;

        assert_eq!(
            result.decision_type(),
            Some(DecisionType::PriorityResolvedQuorum)
        );
        assert_eq!(result.proof.priority_rank, Some(0));
        assert_eq!(result.proof.agreeing_engines, vec!["e1", "e3"]);
        assert_eq!(result.winner_engine.as_deref(), Some("e3"));
        assert!(result.fallback_used);
    }

    #[tokio::test]
    async fn test_priority_resolution_is_order_independent() {
        let config = ConsensusConfig {
            priority: EnginePriority::new(&["e1", "e2", "e3", "e4"]),
            ..ConsensusConfig::default()
        };
        let engine = ConsensusEngine::new(config);
        let forward = engine
            .decide(&[
                ballot("e1", "X", 9),
                ballot("e2", "Y", 9),
                ballot("e3", "X", 9),
                ballot("e4", "Y", 9),
            ])
            .await;
        let reversed = engine
            .decide(&[
                ballot("e4", "Y", 9),
                ballot("e3", "X", 9),
                ballot("e2", "Y", 9),
                ballot("e1", "X", 9),
            ])
            .await;
        assert_eq!(forward.winner_engine, reversed.winner_engine);
        assert_eq!(forward.proof.consensus_hash, reversed.proof.consensus_hash);
    }

    #[tokio::test]
    async fn test_default_priority_prefers_engine_a_group() {
        let engine = engine();
        let forward = engine
            .decide(&[
                ballot("engine_a", "X", 40),
                ballot("engine_b", "Y", 5),
                ballot("engine_c", "Y", 5),
                ballot("tiebreaker", "X", 30),
            ])
            .await;
        let reversed = engine
            .decide(&[
                ballot("tiebreaker", "X", 30),
                ballot("engine_c", "Y", 5),
                ballot("engine_b", "Y", 5),
                ballot("engine_a", "X", 40),
            ])
            .await;

        for result in [&forward, &reversed] {
            assert_eq!(
                result.decision_type(),
                Some(DecisionType::PriorityResolvedQuorum)
            );
            assert_eq!(result.proof.priority_rank, Some(0));
            assert_eq!(result.winner_engine.as_deref(), Some("tiebreaker"));
            let mut agreeing = result.proof.agreeing_engines.clone();
            agreeing.sort();
            assert_eq!(agreeing, vec!["engine_a", "tiebreaker"]);
        }
        assert_eq!(forward.proof.consensus_hash, reversed.proof.consensus_hash);
    }

    #[tokio::test]
    async fn test_validator_exclusion_names_threshold() {
        let result = engine()
            .decide(&[
                scored("engine_a", "X", 10, 50.0),
                scored("engine_b", "X", 10, 50.0),
                scored("engine_c", "X", 10, 100.0),
            ])
            .await;
        assert!(!result.accepted);
        assert_eq!(result.proof.reason_code, Some(ReasonCode::InsufficientResponses));
        assert!(result.reason.contains("validation threshold of 70"));
        assert!(result.proof.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_diagnostics_list_excluded() {
        let config = ConsensusConfig {
            diagnostics: true,
            ..ConsensusConfig::default()
        };
        let result = ConsensusEngine::new(config)
            .decide(&[
                scored("engine_a", "X", 10, 50.0),
                ballot("engine_b", "X", 10),
                ballot("engine_c", "X", 10),
            ])
            .await;
        assert!(result.accepted);
        assert_eq!(result.proof.diagnostics.len(), 1);
        assert_eq!(result.proof.diagnostics[0].engine, "engine_a");
        assert_eq!(result.proof.agreement_count, 2);
    }

    #[tokio::test]
    async fn test_hard_failure_excluded_despite_score() {
        let mut unsafe_report = report(75.0);
        unsafe_report.hard_failures.push("safety_validation".into());
        let result = engine()
            .decide(&[
                Ballot::validated(
                    EngineResponse::new("engine_a", Payload::text("X", "m")),
                    unsafe_report,
                ),
                ballot("engine_b", "Y", 10),
                timeout("engine_c"),
            ])
            .await;
        assert!(!result.accepted);
        assert_eq!(result.proof.validation_scores["engine_a"], 75.0);
    }

    #[tokio::test]
    async fn test_fraction_quorum_requires_majority_of_five() {
        let config = ConsensusConfig {
            quorum: QuorumRule::Fraction(0.6),
            priority: EnginePriority::new(&["e1", "e2", "e3", "e4", "e5"]),
            ..ConsensusConfig::default()
        };
        let result = ConsensusEngine::new(config)
            .decide(&[
                ballot("e1", "X", 1),
                ballot("e2", "X", 1),
                ballot("e3", "Y", 1),
                ballot("e4", "Y", 1),
                ballot("e5", "Z", 1),
            ])
            .await;
        assert_eq!(result.decision_type(), Some(DecisionType::PriorityFallback));
    }

    #[test]
    fn test_config_validation() {
        let bad = ConsensusConfig {
            acceptance_threshold: 120.0,
            ..ConsensusConfig::default()
        };
        assert!(bad.validate().is_err());
        assert!(ConsensusConfig::default().validate().is_ok());
    }

    #[test]
    fn test_quorum_must_be_reachable() {
        let config = ConsensusConfig {
            quorum: QuorumRule::AtLeast(5),
            ..ConsensusConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.validate_for(3),
            Err(Error::InvalidConfig(_))
        ));
        assert!(config.validate_for(5).is_ok());

        let default = ConsensusConfig::default();
        assert!(default.validate_for(3).is_ok());
        assert!(default.validate_for(2).is_ok());
        assert!(default.validate_for(1).is_err());
    }
}
