//! Structured logging setup.
//!
//! The crate logs through `tracing`; this module installs a
//! `tracing-subscriber` formatter with a level filter built from
//! [`LoggingConfig`].

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Full text lines
    #[default]
    Text,
    /// Compact single-line text
    Compact,
}

/// Logger configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Per-target levels, e.g. `trident::consensus = "debug"`
    pub targets: BTreeMap<String, String>,
    /// Let `RUST_LOG` override the configured filter
    pub use_env: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            targets: BTreeMap::new(),
            use_env: true,
        }
    }
}

impl LoggingConfig {
    /// Set the default level.
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    /// Set a level for one target.
    pub fn with_target(mut self, target: &str, level: &str) -> Self {
        self.targets.insert(target.to_string(), level.to_string());
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Filter directive string, e.g. `info,trident::audit=debug`.
    pub fn directive(&self) -> String {
        let mut directive = self.level.clone();
        for (target, level) in &self.targets {
            directive.push_str(&format!(",{}={}", target, level));
        }
        directive
    }

    /// Build the level filter.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        if self.use_env {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }
        EnvFilter::try_new(self.directive())
            .map_err(|e| Error::InvalidConfig(format!("log filter: {}", e)))
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, so calling this
/// more than once is harmless.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive() {
        let config = LoggingConfig::default()
            .with_level("warn")
            .with_target("trident::consensus", "debug")
            .with_target("trident::audit", "trace");
        assert_eq!(
            config.directive(),
            "warn,trident::audit=trace,trident::consensus=debug"
        );
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            use_env: false,
            ..LoggingConfig::default().with_target("trident", "loud")
        };
        assert!(matches!(config.env_filter(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            use_env: false,
            ..LoggingConfig::default().with_format(LogFormat::Compact)
        };
        init_tracing(&config).unwrap();
        assert!(!init_tracing(&config).unwrap());
    }

    #[test]
    fn test_config_from_json() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"level": "debug", "format": "compact"}"#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.targets.is_empty());
    }
}
