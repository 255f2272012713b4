//! Evidence audit configuration.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Audit layer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Traces kept by the in-memory log before the oldest are evicted
    pub max_traces: usize,
    /// Hex-encoded 32-byte Ed25519 seed; a random key is used when absent
    pub signing_seed: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_traces: 10_000,
            signing_seed: None,
        }
    }
}

impl AuditConfig {
    /// Decode the configured seed.
    pub fn seed_bytes(&self) -> Result<Option<[u8; 32]>> {
        let Some(seed) = &self.signing_seed else {
            return Ok(None);
        };
        let bytes = hex::decode(seed)
            .map_err(|e| Error::InvalidKeyFormat(format!("signing seed: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKeyFormat("signing seed must be 32 bytes".into()))?;
        Ok(Some(seed))
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_traces == 0 {
            return Err(Error::InvalidConfig("max_traces must be greater than zero".into()));
        }
        self.seed_bytes().map(|_| ())
    }
}
