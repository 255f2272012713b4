//! Parallel fan-out to every configured engine.
//!
//! One task per engine, each bounded by the per-engine timeout. The join
//! loop races an optional aggregate deadline; when it fires the remaining
//! tasks are aborted and their slots become timeout sentinels. Every engine
//! always gets exactly one slot.

use crate::core::{Error, Result};
use crate::dispatch::config::DispatchConfig;
use crate::engine::EngineAdapter;
use crate::model::{EngineResponse, ErrorKind, GenerationRequest};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Responses of one fan-out, in engine configuration order.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    /// One response (or sentinel) per engine
    pub responses: Vec<EngineResponse>,
    /// Wall-clock time of the fan-out
    pub elapsed_ms: u64,
    /// Whether the aggregate deadline cut the fan-out short
    pub deadline_exceeded: bool,
}

impl DispatchReport {
    /// Response for an engine.
    pub fn get(&self, engine: &str) -> Option<&EngineResponse> {
        self.responses.iter().find(|r| r.engine == engine)
    }

    /// Number of sentinel slots.
    pub fn failures(&self) -> usize {
        self.responses.iter().filter(|r| r.is_sentinel()).count()
    }

    /// Engine ids in slot order.
    pub fn engines(&self) -> Vec<String> {
        self.responses.iter().map(|r| r.engine.clone()).collect()
    }
}

/// Issues one request to every engine concurrently.
pub struct ParallelDispatcher {
    engines: Vec<Arc<dyn EngineAdapter>>,
    config: DispatchConfig,
}

impl ParallelDispatcher {
    /// Create a dispatcher. Engine ids must be unique and non-empty.
    pub fn new(engines: Vec<Arc<dyn EngineAdapter>>, config: DispatchConfig) -> Result<Self> {
        config.validate()?;
        if engines.is_empty() {
            return Err(Error::InvalidConfig("at least one engine is required".into()));
        }
        let mut seen = HashSet::new();
        for engine in &engines {
            if engine.id().is_empty() {
                return Err(Error::InvalidConfig("engine id must not be empty".into()));
            }
            if !seen.insert(engine.id().to_string()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate engine id: {}",
                    engine.id()
                )));
            }
        }
        Ok(Self { engines, config })
    }

    /// Configured engines.
    pub fn engines(&self) -> &[Arc<dyn EngineAdapter>] {
        &self.engines
    }

    /// Configured engine ids.
    pub fn engine_ids(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.id().to_string()).collect()
    }

    /// Timing configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Fan the request out and wait for every engine.
    pub async fn dispatch(&self, request: &GenerationRequest) -> DispatchReport {
        let started = Instant::now();
        let per_engine = self.config.engine_timeout();
        let request = Arc::new(request.clone());

        info!(
            request = %request.id,
            engines = self.engines.len(),
            "dispatching to engines"
        );

        let mut join_set = JoinSet::new();
        for (slot, engine) in self.engines.iter().enumerate() {
            let engine = Arc::clone(engine);
            let request = Arc::clone(&request);

            join_set.spawn(async move {
                let call_started = Instant::now();
                let outcome = tokio::time::timeout(per_engine, engine.generate(&request)).await;
                let response = settle(
                    engine.id(),
                    outcome.map_err(|_| Error::EngineTimeout {
                        engine: engine.id().to_string(),
                        timeout_ms: per_engine.as_millis() as u64,
                    }),
                    call_started.elapsed().as_millis() as u64,
                );
                (slot, response)
            });
        }

        let mut slots: Vec<Option<EngineResponse>> = vec![None; self.engines.len()];
        let deadline = self.config.aggregate_timeout().map(|d| started + d);
        let mut deadline_exceeded = false;

        loop {
            let next = match deadline {
                Some(deadline) => tokio::select! {
                    next = join_set.join_next() => next,
                    _ = tokio::time::sleep_until(deadline) => {
                        deadline_exceeded = true;
                        break;
                    }
                },
                None => join_set.join_next().await,
            };

            match next {
                Some(Ok((slot, response))) => slots[slot] = Some(response),
                Some(Err(e)) => warn!(error = %e, "engine task did not complete"),
                None => break,
            }
        }

        if deadline_exceeded {
            warn!(
                request = %request.id,
                pending = join_set.len(),
                "aggregate deadline reached, cancelling pending engines"
            );
            join_set.abort_all();
            // Tasks that finished before the abort still report.
            while let Some(next) = join_set.join_next().await {
                if let Ok((slot, response)) = next {
                    slots[slot] = Some(response);
                }
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let responses: Vec<EngineResponse> = slots
            .into_iter()
            .zip(&self.engines)
            .map(|(slot, engine)| {
                slot.unwrap_or_else(|| {
                    if deadline_exceeded {
                        EngineResponse::sentinel(engine.id(), ErrorKind::Timeout, elapsed_ms)
                    } else {
                        warn!(engine = engine.id(), "engine task panicked");
                        EngineResponse::sentinel(engine.id(), ErrorKind::Panicked, elapsed_ms)
                    }
                })
            })
            .collect();

        let report = DispatchReport {
            responses,
            elapsed_ms,
            deadline_exceeded,
        };
        debug!(
            request = %request.id,
            elapsed_ms,
            failures = report.failures(),
            "dispatch complete"
        );
        report
    }
}

/// Turn a call outcome into a slot value.
fn settle(
    engine: &str,
    outcome: Result<Result<EngineResponse>>,
    elapsed_ms: u64,
) -> EngineResponse {
    match outcome {
        Ok(Ok(response)) if response.engine == engine => response,
        Ok(Ok(response)) => {
            warn!(
                engine,
                reported = %response.engine,
                "engine answered under a different id"
            );
            EngineResponse::sentinel(engine, ErrorKind::EngineIdMismatch, elapsed_ms)
        }
        Ok(Err(e)) => {
            warn!(engine, error = %e, "engine call failed");
            EngineResponse::sentinel(engine, ErrorKind::Error, elapsed_ms)
        }
        Err(e) => {
            warn!(engine, error = %e, "engine call timed out");
            EngineResponse::sentinel(engine, ErrorKind::Timeout, elapsed_ms)
        }
    }
}
