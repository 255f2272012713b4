//! The redundant generation pipeline.
//!
//! One call to [`TmrPipeline::generate`] runs:
//! - policy admission of the request's intent
//! - trace opening
//! - parallel fan-out to every engine
//! - validation of each real response
//! - the consensus decision
//! - signing and evidence commit
//!
//! Every path ends in a well-formed [`ConsensusResult`].

use crate::audit::{Ed25519Signer, EvidenceAuditor, InMemoryTraceLog, Signer, TraceLog};
use crate::consensus::{Ballot, ConsensusEngine, EngineTiebreaker, Tiebreaker};
use crate::core::Result;
use crate::dispatch::ParallelDispatcher;
use crate::engine::{probe_engines, EngineAdapter, HealthReport};
use crate::model::{ConsensusResult, DecisionProof, GenerationRequest, ReasonCode};
use crate::monitoring::{MetricsSnapshot, PipelineMetrics};
use crate::pipeline::config::PipelineConfig;
use crate::policy::{GenerationIntent, GuardrailGate, PolicyGate};
use crate::validation::ResponseValidator;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Redundant generation pipeline.
pub struct TmrPipeline {
    config: PipelineConfig,
    policy: Arc<dyn PolicyGate>,
    dispatcher: ParallelDispatcher,
    validator: ResponseValidator,
    consensus: ConsensusEngine,
    auditor: EvidenceAuditor,
    metrics: PipelineMetrics,
}

impl TmrPipeline {
    /// Build a pipeline with the reference collaborators: the default
    /// guardrail gate, the configured validator, an Ed25519 signer and an
    /// in-memory trace log. No tiebreaker is attached.
    pub fn new(config: PipelineConfig, engines: Vec<Arc<dyn EngineAdapter>>) -> Result<Self> {
        config.validate()?;
        config.consensus.validate_for(engines.len())?;

        let signer: Arc<dyn Signer> = match config.audit.seed_bytes()? {
            Some(seed) => Arc::new(Ed25519Signer::from_seed(&seed)),
            None => Arc::new(Ed25519Signer::new()),
        };
        let trace_log: Arc<dyn TraceLog> =
            Arc::new(InMemoryTraceLog::new(config.audit.max_traces));

        let pipeline = Self {
            policy: Arc::new(GuardrailGate::with_defaults()),
            dispatcher: ParallelDispatcher::new(engines, config.dispatch.clone())?,
            validator: ResponseValidator::new(&config.validator),
            consensus: ConsensusEngine::new(config.consensus.clone()),
            auditor: EvidenceAuditor::new(signer, trace_log),
            metrics: PipelineMetrics::new(),
            config,
        };
        info!(
            agent = %pipeline.config.agent_id,
            engines = ?pipeline.dispatcher.engine_ids(),
            "pipeline ready"
        );
        Ok(pipeline)
    }

    /// Replace the policy gate.
    pub fn with_policy(mut self, policy: Arc<dyn PolicyGate>) -> Self {
        self.policy = policy;
        self
    }

    /// Attach a tiebreaker.
    pub fn with_tiebreaker(mut self, tiebreaker: Arc<dyn Tiebreaker>) -> Self {
        self.consensus = self.consensus.with_tiebreaker(tiebreaker);
        self
    }

    /// Use an engine adapter as the tiebreaker.
    pub fn with_tiebreaker_engine(self, engine: Arc<dyn EngineAdapter>) -> Self {
        self.with_tiebreaker(Arc::new(EngineTiebreaker::new(engine)))
    }

    /// Replace the validator.
    pub fn with_validator(mut self, validator: ResponseValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the signer.
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.auditor = EvidenceAuditor::new(signer, self.auditor.trace_log().clone());
        self
    }

    /// Replace the trace log.
    pub fn with_trace_log(mut self, trace_log: Arc<dyn TraceLog>) -> Self {
        self.auditor = EvidenceAuditor::new(self.auditor.signer().clone(), trace_log);
        self
    }

    /// Configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Configured engine ids, in dispatch order.
    pub fn engine_ids(&self) -> Vec<String> {
        self.dispatcher.engine_ids()
    }

    /// Run one request through the pipeline.
    pub async fn generate(&self, request: &GenerationRequest) -> ConsensusResult {
        self.generate_with_intent(request, GenerationIntent::from_request(request))
            .await
    }

    /// Run one request under a caller-built intent (e.g. with a risk level).
    pub async fn generate_with_intent(
        &self,
        request: &GenerationRequest,
        intent: GenerationIntent,
    ) -> ConsensusResult {
        self.metrics.record_request();

        let decision = self.policy.evaluate(&intent);
        if !decision.allowed {
            let reason = decision
                .reason
                .unwrap_or_else(|| "request denied by policy".to_string());
            warn!(request = %request.id, reason = %reason, "policy rejected request");
            let result = ConsensusResult::rejected(
                ReasonCode::PolicyViolation,
                format!("policy_violation: {}", reason),
                DecisionProof::default(),
            );
            self.metrics.record_result(&result);
            return result;
        }

        let trace_id = self.auditor.begin(&intent).await;

        let report = self.dispatcher.dispatch(request).await;
        let cost: f64 = report.responses.iter().map(|r| r.cost).sum();
        self.metrics.record_dispatch(report.elapsed_ms, cost);
        debug!(
            request = %request.id,
            elapsed_ms = report.elapsed_ms,
            failures = report.failures(),
            "dispatch finished"
        );

        let ballots: Vec<Ballot> = report
            .responses
            .into_iter()
            .map(|response| {
                if response.is_sentinel() {
                    Ballot::unvalidated(response)
                } else {
                    let validation = self.validator.validate(&response);
                    Ballot::validated(response, validation)
                }
            })
            .collect();

        let result = self.consensus.decide(&ballots).await;
        let result = self.auditor.seal(trace_id.as_deref(), result).await;

        info!(
            request = %request.id,
            accepted = result.accepted,
            decision = result.decision_type().map(|t| t.as_str()).unwrap_or("none"),
            winner = result.winner_engine.as_deref().unwrap_or("-"),
            "request finished"
        );
        self.metrics.record_result(&result);
        result
    }

    /// Probe every engine.
    pub async fn health(&self) -> HealthReport {
        probe_engines(
            &self.config.agent_id,
            self.dispatcher.engines(),
            self.config.health_timeout(),
        )
        .await
    }

    /// Current metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The trace log results are committed to.
    pub fn trace_log(&self) -> &Arc<dyn TraceLog> {
        self.auditor.trace_log()
    }
}
