//! Response validator.
//!
//! Runs every configured check on a response and folds the outcomes into a
//! `ValidationReport`. The score is the share of checks that did not fail;
//! warnings count as passed.

use crate::core::{Error, Result};
use crate::model::{EngineResponse, ValidationReport};
use crate::validation::check::{CheckStatus, ResponseCheck};
use crate::validation::compliance::ComplianceCheck;
use crate::validation::domain_id::DomainIdCheck;
use crate::validation::safety::{SafetyCheck, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::validation::schema::{SchemaCheck, SCHEMA_CHECK};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Safety size limit on the serialized payload
    pub max_payload_bytes: usize,
    /// Run the documentation convention check
    pub check_compliance: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            check_compliance: true,
        }
    }
}

impl ValidatorConfig {
    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_payload_bytes == 0 {
            return Err(Error::InvalidConfig(
                "max_payload_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Validates engine responses.
pub struct ResponseValidator {
    checks: Vec<Box<dyn ResponseCheck>>,
}

impl ResponseValidator {
    /// Validator with the standard checks.
    pub fn new(config: &ValidatorConfig) -> Self {
        let mut checks: Vec<Box<dyn ResponseCheck>> =
            vec![Box::new(SchemaCheck), Box::new(DomainIdCheck)];
        if config.check_compliance {
            checks.push(Box::new(ComplianceCheck));
        }
        checks.push(Box::new(SafetyCheck::new(config.max_payload_bytes)));
        Self { checks }
    }

    /// Validator with no checks.
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a check.
    pub fn with_check(mut self, check: Box<dyn ResponseCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Names of the configured checks, in evaluation order.
    pub fn check_names(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.name().to_string()).collect()
    }

    /// Validate one response.
    pub fn validate(&self, response: &EngineResponse) -> ValidationReport {
        let mut report = ValidationReport {
            schema_ok: true,
            rules: Vec::new(),
            score: 0.0,
            errors: Vec::new(),
            warnings: Vec::new(),
            hard_failures: Vec::new(),
        };

        for check in &self.checks {
            let outcome = check.check(&response.content);
            match outcome.status {
                CheckStatus::Passed => report.rules.push(outcome.check),
                CheckStatus::Warned => {
                    report.warnings.extend(outcome.findings);
                    report.rules.push(outcome.check);
                }
                CheckStatus::Failed => {
                    if outcome.check == SCHEMA_CHECK {
                        report.schema_ok = false;
                    }
                    if check.gating() {
                        report.hard_failures.push(outcome.check);
                    }
                    report.errors.extend(outcome.findings);
                }
            }
        }

        if !self.checks.is_empty() {
            report.score = 100.0 * report.rules.len() as f64 / self.checks.len() as f64;
        }

        debug!(
            engine = %response.engine,
            score = report.score,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "response validated"
        );
        report
    }
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new(&ValidatorConfig::default())
    }
}
