//! Technical documentation conventions.
//!
//! Findings here are warnings: a response that cites a malformed
//! document-module code is still a candidate.

use crate::model::payload::RESPONSE_FIELD;
use crate::model::Payload;
use crate::validation::check::{CheckOutcome, ResponseCheck};
use regex::Regex;
use std::sync::LazyLock;

/// Check name.
pub const COMPLIANCE_CHECK: &str = "compliance_validation";

static DM_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DMC-[A-Z0-9]+-[A-Z]+-\d{2}-\d{2}-\d{2}-\d{2}[A-Z]?-\d{3}[A-Z]?-[A-Z]$")
        .expect("valid regex")
});

static DM_CODE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DMC-[A-Z0-9-]+").expect("valid regex"));

static CSDB_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CSDB-[A-Z0-9-]+").expect("valid regex"));

static XML_ELEMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)<dmodule.*?>", r"(?i)<dmTitle>", r"(?i)<dmCode.*?>"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

/// Malformed document-module codes referenced in `text`.
pub fn invalid_dm_codes(text: &str) -> Vec<String> {
    if !text.contains("DM") && !text.to_lowercase().contains("dmcode") {
        return Vec::new();
    }
    DM_CODE_REF_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|code| !DM_CODE_RE.is_match(code))
        .map(str::to_string)
        .collect()
}

/// Whether `text` carries the required data-module XML elements.
pub fn has_dmodule_structure(text: &str) -> bool {
    XML_ELEMENTS.iter().all(|re| re.is_match(text))
}

/// Whether every `CSDB-` reference has at least three parts.
pub fn csdb_references_valid(text: &str) -> bool {
    CSDB_REF_RE
        .find_iter(text)
        .all(|m| m.as_str().split('-').count() >= 3)
}

fn claims_xml(content: &Payload) -> bool {
    content
        .get("format")
        .and_then(|f| f.get("ext"))
        .and_then(|e| e.as_str())
        .is_some_and(|ext| ext.to_lowercase().contains("xml"))
}

/// Document convention check.
#[derive(Clone, Debug, Default)]
pub struct ComplianceCheck;

impl ResponseCheck for ComplianceCheck {
    fn name(&self) -> &str {
        COMPLIANCE_CHECK
    }

    fn check(&self, content: &Payload) -> CheckOutcome {
        let text = content.get_str(RESPONSE_FIELD).unwrap_or_default();
        let mut warnings: Vec<String> = invalid_dm_codes(text)
            .into_iter()
            .map(|code| format!("Invalid DM code format: {}", code))
            .collect();

        if claims_xml(content) && !has_dmodule_structure(text) {
            warnings.push("Invalid data module XML structure".to_string());
        }

        if text.to_lowercase().contains("csdb") && !csdb_references_valid(text) {
            warnings.push("CSDB reference constraint violations detected".to_string());
        }

        CheckOutcome::from_warnings(COMPLIANCE_CHECK, warnings)
    }
}
