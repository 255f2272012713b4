//! Dispatcher configuration.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fan-out timing limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Bound on each engine call
    pub engine_timeout_ms: u64,
    /// Bound on the whole fan-out, none to rely on per-engine timeouts
    pub aggregate_timeout_ms: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            engine_timeout_ms: 30_000,
            aggregate_timeout_ms: Some(45_000),
        }
    }
}

impl DispatchConfig {
    /// Config with the given per-engine timeout and no aggregate deadline.
    pub fn with_engine_timeout(engine_timeout: Duration) -> Self {
        Self {
            engine_timeout_ms: engine_timeout.as_millis() as u64,
            aggregate_timeout_ms: None,
        }
    }

    /// Set the aggregate deadline.
    pub fn with_aggregate_timeout(mut self, aggregate_timeout: Duration) -> Self {
        self.aggregate_timeout_ms = Some(aggregate_timeout.as_millis() as u64);
        self
    }

    /// Per-engine timeout.
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    /// Aggregate deadline.
    pub fn aggregate_timeout(&self) -> Option<Duration> {
        self.aggregate_timeout_ms.map(Duration::from_millis)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if self.engine_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "engine_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.aggregate_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "aggregate_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
