//! Pipeline configuration.

use crate::audit::AuditConfig;
use crate::consensus::ConsensusConfig;
use crate::core::{Error, Result};
use crate::dispatch::DispatchConfig;
use crate::monitoring::LoggingConfig;
use crate::validation::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default component name in health reports.
pub const DEFAULT_AGENT_ID: &str = "tmr-backend";

/// Configuration for a whole pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Component name in health reports
    pub agent_id: String,
    /// Bound on each engine health probe
    pub health_timeout_ms: u64,
    pub dispatch: DispatchConfig,
    pub validator: ValidatorConfig,
    pub consensus: ConsensusConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            agent_id: DEFAULT_AGENT_ID.to_string(),
            health_timeout_ms: 5_000,
            dispatch: DispatchConfig::default(),
            validator: ValidatorConfig::default(),
            consensus: ConsensusConfig::default(),
            audit: AuditConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Health probe timeout.
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        if self.agent_id.trim().is_empty() {
            return Err(Error::InvalidConfig("agent_id must not be empty".into()));
        }
        if self.health_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "health_timeout_ms must be greater than zero".into(),
            ));
        }
        self.dispatch.validate()?;
        self.validator.validate()?;
        self.consensus.validate()?;
        self.audit.validate()
    }
}
