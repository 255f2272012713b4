//! Domain identifier conventions.
//!
//! Optional `utcs_id` and `artifact_id` fields must follow the
//! `AQUART-<TYPE>-...-v<major>.<minor>` naming scheme. Their absence is not
//! a failure, but a payload without `response` and `model` is not a
//! reproducible artifact and fails here too.

use crate::model::payload::{MODEL_FIELD, RESPONSE_FIELD};
use crate::model::Payload;
use crate::validation::check::{CheckOutcome, ResponseCheck};
use regex::Regex;
use std::sync::LazyLock;

/// Check name.
pub const DOMAIN_ID_CHECK: &str = "domain_id_validation";

/// Field holding a full identifier.
pub const UTCS_ID_FIELD: &str = "utcs_id";

/// Field holding an artifact identifier.
pub const ARTIFACT_ID_FIELD: &str = "artifact_id";

static UTCS_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^AQUART-[A-Z]{3,4}-[A-Z0-9_-]+-[a-zA-Z0-9_-]+-v\d+\.\d+$").expect("valid regex")
});

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+\.\d+$").expect("valid regex"));

/// Whether an artifact id has at least four parts, an `AQUART` prefix and a
/// version suffix.
pub fn is_valid_artifact_id(artifact_id: &str) -> bool {
    let parts: Vec<&str> = artifact_id.split('-').collect();
    parts.len() >= 4
        && parts[0] == "AQUART"
        && parts.last().is_some_and(|v| VERSION_RE.is_match(v))
}

/// Whether a full identifier matches the naming scheme.
pub fn is_valid_utcs_id(utcs_id: &str) -> bool {
    UTCS_ID_RE.is_match(utcs_id)
}

/// Domain identifier check.
#[derive(Clone, Debug, Default)]
pub struct DomainIdCheck;

impl ResponseCheck for DomainIdCheck {
    fn name(&self) -> &str {
        DOMAIN_ID_CHECK
    }

    fn gating(&self) -> bool {
        true
    }

    fn check(&self, content: &Payload) -> CheckOutcome {
        let mut errors = Vec::new();

        if let Some(value) = content.get(UTCS_ID_FIELD) {
            match value.as_str() {
                Some(id) if is_valid_utcs_id(id) => {}
                _ => errors.push(format!("Invalid identifier format: {}", value)),
            }
        }

        if let Some(value) = content.get(ARTIFACT_ID_FIELD) {
            match value.as_str() {
                Some(id) if is_valid_artifact_id(id) => {}
                _ => errors.push(format!("Invalid artifact identifier: {}", value)),
            }
        }

        if !content.contains_key(RESPONSE_FIELD) || !content.contains_key(MODEL_FIELD) {
            errors.push("Response lacks reproducible structure".to_string());
        }

        CheckOutcome::from_errors(DOMAIN_ID_CHECK, errors)
    }
}
