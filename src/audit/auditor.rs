//! Evidence auditor.
//!
//! Seals a consensus result: opens a trace, signs the result and commits it
//! as evidence. Audit problems never change the decision; they are logged
//! against the trace and the unsigned result is returned.

use crate::audit::signer::{verify_envelope, Signer};
use crate::audit::trace::TraceLog;
use crate::core::{Error, Result};
use crate::model::ConsensusResult;
use crate::policy::GenerationIntent;
use std::sync::Arc;
use tracing::{debug, warn};

/// Signs and records consensus results.
pub struct EvidenceAuditor {
    signer: Arc<dyn Signer>,
    trace_log: Arc<dyn TraceLog>,
}

impl EvidenceAuditor {
    /// Create from a signer and a trace log.
    pub fn new(signer: Arc<dyn Signer>, trace_log: Arc<dyn TraceLog>) -> Self {
        Self { signer, trace_log }
    }

    /// The signer.
    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    /// The trace log.
    pub fn trace_log(&self) -> &Arc<dyn TraceLog> {
        &self.trace_log
    }

    /// Open a trace for an admitted intent.
    pub async fn begin(&self, intent: &GenerationIntent) -> Option<String> {
        match self.trace_log.begin_trace(intent).await {
            Ok(trace_id) => {
                debug!(trace_id = %trace_id, intent = %intent.id, "trace opened");
                Some(trace_id)
            }
            Err(e) => {
                warn!(intent = %intent.id, error = %e, "could not open trace");
                None
            }
        }
    }

    /// Attach trace id and signature, then commit the evidence.
    pub async fn seal(
        &self,
        trace_id: Option<&str>,
        mut result: ConsensusResult,
    ) -> ConsensusResult {
        let Some(trace_id) = trace_id else {
            return result;
        };
        result.proof.trace_id = Some(trace_id.to_string());

        match self.sign_and_commit(trace_id, &result).await {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!(trace_id, error = %e, "audit failed, returning unsigned result");
                if let Err(log_err) = self.trace_log.log_failure(trace_id, &e.to_string()).await {
                    warn!(trace_id, error = %log_err, "could not record audit failure");
                }
                result
            }
        }
    }

    async fn sign_and_commit(
        &self,
        trace_id: &str,
        result: &ConsensusResult,
    ) -> Result<ConsensusResult> {
        let envelope = self.signer.sign(&result.signable_value()?)?;
        let mut sealed = result.clone();
        sealed.proof.signature = Some(envelope);

        let evidence = serde_json::to_value(&sealed)?;
        self.trace_log.commit_trace(trace_id, evidence).await?;
        debug!(trace_id, "trace committed");
        Ok(sealed)
    }

    /// Open a trace and seal `result` under it.
    pub async fn audit(
        &self,
        intent: &GenerationIntent,
        result: ConsensusResult,
    ) -> ConsensusResult {
        let trace_id = self.begin(intent).await;
        self.seal(trace_id.as_deref(), result).await
    }
}

/// Check the signature carried by a result.
pub fn verify_result(result: &ConsensusResult) -> Result<()> {
    let envelope = result
        .proof
        .signature
        .as_ref()
        .ok_or(Error::SignatureVerificationFailed)?;
    verify_envelope(&result.signable_value()?, envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::signer::Ed25519Signer;
    use crate::audit::trace::{InMemoryTraceLog, TraceStatus};
    use crate::model::{DecisionProof, DecisionType, GenerationRequest, Payload, SignatureEnvelope};
    use serde_json::Value;

    struct BrokenSigner;

    impl Signer for BrokenSigner {
        fn sign(&self, _value: &Value) -> Result<SignatureEnvelope> {
            Err(Error::SigningFailed("hsm offline".into()))
        }
    }

    fn result() -> ConsensusResult {
        let proof = DecisionProof {
            decision_type: Some(DecisionType::Quorum),
            chosen_engine: Some("engine_a".into()),
            ..DecisionProof::default()
        };
        ConsensusResult::accepted("engine_a", Payload::text("X", "m"), proof, "quorum".into())
    }

    fn intent() -> GenerationIntent {
        GenerationIntent::from_request(&GenerationRequest::new("t"))
    }

    #[tokio::test]
    async fn test_seal_signs_and_commits() {
        let log = Arc::new(InMemoryTraceLog::default());
        let auditor = EvidenceAuditor::new(Arc::new(Ed25519Signer::new()), log.clone());

        let sealed = auditor.audit(&intent(), result()).await;
        let trace_id = sealed.proof.trace_id.clone().unwrap();

        assert!(sealed.proof.signature.is_some());
        assert!(verify_result(&sealed).is_ok());
        let record = log.get(&trace_id).await.unwrap();
        assert_eq!(record.status, TraceStatus::Committed);
        assert_eq!(
            record.evidence.unwrap()["winner_engine"],
            Value::String("engine_a".into())
        );
    }

    #[tokio::test]
    async fn test_decision_unchanged_by_signing_failure() {
        let log = Arc::new(InMemoryTraceLog::default());
        let auditor = EvidenceAuditor::new(Arc::new(BrokenSigner), log.clone());

        let original = result();
        let sealed = auditor.audit(&intent(), original.clone()).await;

        assert!(sealed.proof.signature.is_none());
        assert_eq!(sealed.winner_engine, original.winner_engine);
        assert_eq!(sealed.accepted, original.accepted);
        let record = log.get(sealed.proof.trace_id.as_deref().unwrap()).await.unwrap();
        assert_eq!(record.status, TraceStatus::Failed);
        assert!(record.error.unwrap().contains("hsm offline"));
    }

    #[tokio::test]
    async fn test_tampered_result_fails_verification() {
        let auditor = EvidenceAuditor::new(
            Arc::new(Ed25519Signer::new()),
            Arc::new(InMemoryTraceLog::default()),
        );
        let mut sealed = auditor.audit(&intent(), result()).await;
        sealed.winner_engine = Some("engine_b".into());
        assert!(verify_result(&sealed).is_err());
    }

    #[test]
    fn test_unsigned_result_fails_verification() {
        assert!(verify_result(&result()).is_err());
    }
}
