//! Trace log for pipeline invocations.
//!
//! A trace is opened when an admitted intent is about to be dispatched and
//! closed exactly once, either committed with its evidence or marked failed.

use crate::core::{new_id, now, Error, Result, Timestamp};
use crate::policy::GenerationIntent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Lifecycle state of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Open,
    Committed,
    Failed,
}

/// One recorded trace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceRecord {
    pub trace_id: String,
    /// Intent that opened the trace
    pub intent_id: String,
    /// Originating request
    pub prompt_id: String,
    pub kind: String,
    pub status: TraceStatus,
    pub opened: Timestamp,
    pub closed: Option<Timestamp>,
    /// Committed evidence
    pub evidence: Option<Value>,
    /// Failure description
    pub error: Option<String>,
}

/// Filter for trace queries.
#[derive(Clone, Debug, Default)]
pub struct TraceFilter {
    pub status: Option<TraceStatus>,
    pub prompt_id: Option<String>,
    pub opened_after: Option<Timestamp>,
}

impl TraceFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status.
    pub fn by_status(mut self, status: TraceStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by request id.
    pub fn by_prompt(mut self, prompt_id: &str) -> Self {
        self.prompt_id = Some(prompt_id.to_string());
        self
    }

    /// Check if a record matches.
    pub fn matches(&self, record: &TraceRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(prompt_id) = &self.prompt_id {
            if &record.prompt_id != prompt_id {
                return false;
            }
        }
        if let Some(after) = self.opened_after {
            if record.opened < after {
                return false;
            }
        }
        true
    }
}

/// Durable record of pipeline invocations.
#[async_trait]
pub trait TraceLog: Send + Sync {
    /// Open a trace, returning its id.
    async fn begin_trace(&self, intent: &GenerationIntent) -> Result<String>;

    /// Close a trace with its evidence.
    async fn commit_trace(&self, trace_id: &str, evidence: Value) -> Result<()>;

    /// Close a trace as failed.
    async fn log_failure(&self, trace_id: &str, error: &str) -> Result<()>;
}

/// Bounded in-memory trace log; the oldest traces are evicted first.
pub struct InMemoryTraceLog {
    traces: RwLock<VecDeque<TraceRecord>>,
    max_traces: usize,
}

impl InMemoryTraceLog {
    /// Create a log holding at most `max_traces` traces.
    pub fn new(max_traces: usize) -> Self {
        Self {
            traces: RwLock::new(VecDeque::new()),
            max_traces: max_traces.max(1),
        }
    }

    /// Look up a trace.
    pub async fn get(&self, trace_id: &str) -> Option<TraceRecord> {
        self.traces
            .read()
            .await
            .iter()
            .find(|t| t.trace_id == trace_id)
            .cloned()
    }

    /// Query traces.
    pub async fn query(&self, filter: &TraceFilter) -> Vec<TraceRecord> {
        self.traces
            .read()
            .await
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    /// Most recent traces, newest first.
    pub async fn recent(&self, n: usize) -> Vec<TraceRecord> {
        self.traces.read().await.iter().rev().take(n).cloned().collect()
    }

    /// Number of stored traces.
    pub async fn count(&self) -> usize {
        self.traces.read().await.len()
    }

    /// Remove every trace.
    pub async fn clear(&self) {
        self.traces.write().await.clear();
    }

    async fn close(
        &self,
        trace_id: &str,
        status: TraceStatus,
        evidence: Option<Value>,
        error: Option<String>,
    ) -> Result<()> {
        let mut traces = self.traces.write().await;
        let record = traces
            .iter_mut()
            .find(|t| t.trace_id == trace_id)
            .ok_or_else(|| Error::TraceNotFound(trace_id.to_string()))?;
        if record.status != TraceStatus::Open {
            return Err(Error::TraceClosed(trace_id.to_string()));
        }
        record.status = status;
        record.closed = Some(now());
        record.evidence = evidence;
        record.error = error;
        Ok(())
    }
}

impl Default for InMemoryTraceLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl TraceLog for InMemoryTraceLog {
    async fn begin_trace(&self, intent: &GenerationIntent) -> Result<String> {
        let record = TraceRecord {
            trace_id: new_id(),
            intent_id: intent.id.clone(),
            prompt_id: intent.prompt_id.clone(),
            kind: intent.kind.clone(),
            status: TraceStatus::Open,
            opened: now(),
            closed: None,
            evidence: None,
            error: None,
        };
        let trace_id = record.trace_id.clone();

        let mut traces = self.traces.write().await;
        while traces.len() >= self.max_traces {
            traces.pop_front();
        }
        traces.push_back(record);
        Ok(trace_id)
    }

    async fn commit_trace(&self, trace_id: &str, evidence: Value) -> Result<()> {
        self.close(trace_id, TraceStatus::Committed, Some(evidence), None)
            .await
    }

    async fn log_failure(&self, trace_id: &str, error: &str) -> Result<()> {
        self.close(trace_id, TraceStatus::Failed, None, Some(error.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GenerationRequest;
    use serde_json::json;

    fn intent(id: &str) -> GenerationIntent {
        GenerationIntent::from_request(&GenerationRequest::new("t").with_id(id))
    }

    #[tokio::test]
    async fn test_begin_and_commit() {
        let log = InMemoryTraceLog::default();
        let trace_id = log.begin_trace(&intent("req-1")).await.unwrap();
        assert_eq!(log.get(&trace_id).await.unwrap().status, TraceStatus::Open);

        log.commit_trace(&trace_id, json!({"accepted": true})).await.unwrap();
        let record = log.get(&trace_id).await.unwrap();
        assert_eq!(record.status, TraceStatus::Committed);
        assert_eq!(record.evidence, Some(json!({"accepted": true})));
        assert!(record.closed.is_some());
    }

    #[tokio::test]
    async fn test_close_only_once() {
        let log = InMemoryTraceLog::default();
        let trace_id = log.begin_trace(&intent("req-1")).await.unwrap();
        log.log_failure(&trace_id, "signing failed").await.unwrap();

        let err = log.commit_trace(&trace_id, json!({})).await.unwrap_err();
        assert!(matches!(err, Error::TraceClosed(_)));
        assert_eq!(
            log.get(&trace_id).await.unwrap().error.as_deref(),
            Some("signing failed")
        );
    }

    #[tokio::test]
    async fn test_unknown_trace() {
        let log = InMemoryTraceLog::default();
        let err = log.log_failure("missing", "x").await.unwrap_err();
        assert!(matches!(err, Error::TraceNotFound(_)));
    }

    #[tokio::test]
    async fn test_query_by_status_and_prompt() {
        let log = InMemoryTraceLog::default();
        let a = log.begin_trace(&intent("req-a")).await.unwrap();
        log.begin_trace(&intent("req-b")).await.unwrap();
        log.commit_trace(&a, json!({})).await.unwrap();

        let committed = log.query(&TraceFilter::new().by_status(TraceStatus::Committed)).await;
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].prompt_id, "req-a");

        let open = log.query(&TraceFilter::new().by_prompt("req-b")).await;
        assert_eq!(open[0].status, TraceStatus::Open);
    }

    #[tokio::test]
    async fn test_oldest_evicted() {
        let log = InMemoryTraceLog::new(2);
        for i in 0..3 {
            log.begin_trace(&intent(&format!("req-{}", i))).await.unwrap();
        }
        assert_eq!(log.count().await, 2);
        let recent = log.recent(5).await;
        assert_eq!(recent[0].prompt_id, "req-2");
        assert_eq!(recent[1].prompt_id, "req-1");
    }
}
