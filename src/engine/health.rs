//! Engine health surface.

use crate::core::{now, Timestamp};
use crate::engine::adapter::EngineAdapter;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Minimum healthy engines for consensus to be possible.
pub const MIN_HEALTHY_FOR_CONSENSUS: usize = 2;

/// Health of a single engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    /// Health check returned true
    Healthy,
    /// Health check returned false
    Unhealthy,
    /// Health check did not answer in time
    Error,
}

/// Per-engine health entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineHealth {
    /// Engine id
    pub name: String,
    /// Status
    pub status: EngineStatus,
    /// When the probe finished
    pub last_check: Timestamp,
    /// Probe error text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall service status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Enough engines for consensus
    Operational,
    /// Consensus not possible
    Degraded,
}

/// Read-only health report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status
    pub status: ServiceStatus,
    /// Per-engine entries, in configuration order
    pub engines: Vec<EngineHealth>,
    /// Healthy engine count
    pub healthy_engines: usize,
    /// True iff at least two engines are healthy
    pub consensus_available: bool,
    /// Reporting component
    pub agent_id: String,
}

impl HealthReport {
    /// Build a report from per-engine entries.
    pub fn from_entries(agent_id: &str, engines: Vec<EngineHealth>) -> Self {
        let healthy_engines = engines
            .iter()
            .filter(|e| e.status == EngineStatus::Healthy)
            .count();
        let consensus_available = healthy_engines >= MIN_HEALTHY_FOR_CONSENSUS;
        Self {
            status: if consensus_available {
                ServiceStatus::Operational
            } else {
                ServiceStatus::Degraded
            },
            engines,
            healthy_engines,
            consensus_available,
            agent_id: agent_id.to_string(),
        }
    }
}

/// Probe every engine concurrently, each bounded by `timeout`.
pub async fn probe_engines(
    agent_id: &str,
    engines: &[Arc<dyn EngineAdapter>],
    timeout: Duration,
) -> HealthReport {
    let probes = engines.iter().map(|engine| async move {
        let (status, error) = match tokio::time::timeout(timeout, engine.health_check()).await {
            Ok(true) => (EngineStatus::Healthy, None),
            Ok(false) => (EngineStatus::Unhealthy, None),
            Err(_) => (
                EngineStatus::Error,
                Some(format!("health check timed out after {}ms", timeout.as_millis())),
            ),
        };
        EngineHealth {
            name: engine.id().to_string(),
            status,
            last_check: now(),
            error,
        }
    });

    HealthReport::from_entries(agent_id, join_all(probes).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scripted::ScriptedEngine;

    fn engines(healthy: &[bool]) -> Vec<Arc<dyn EngineAdapter>> {
        healthy
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let engine = ScriptedEngine::text(&format!("engine_{}", i), "X", "m");
                engine.set_healthy(*h);
                Arc::new(engine) as Arc<dyn EngineAdapter>
            })
            .collect()
    }

    #[tokio::test]
    async fn test_all_healthy() {
        let report = probe_engines("tmr", &engines(&[true, true, true]), Duration::from_secs(1)).await;
        assert_eq!(report.healthy_engines, 3);
        assert!(report.consensus_available);
        assert_eq!(report.status, ServiceStatus::Operational);
    }

    #[tokio::test]
    async fn test_degraded_with_one_healthy() {
        let report =
            probe_engines("tmr", &engines(&[true, false, false]), Duration::from_secs(1)).await;
        assert_eq!(report.healthy_engines, 1);
        assert!(!report.consensus_available);
        assert_eq!(report.status, ServiceStatus::Degraded);
        assert_eq!(report.engines[1].status, EngineStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_two_healthy_is_enough() {
        let report =
            probe_engines("tmr", &engines(&[true, false, true]), Duration::from_secs(1)).await;
        assert!(report.consensus_available);
    }
}
