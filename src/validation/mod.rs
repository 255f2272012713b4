//! Validation Module
//!
//! Per-response checks feeding consensus eligibility:
//! - Schema (gating)
//! - Domain identifiers (gating)
//! - Documentation conventions (warnings only)
//! - Safety screening (gating)

pub mod check;
pub mod compliance;
pub mod domain_id;
pub mod safety;
pub mod schema;
pub mod validator;

pub use check::{CheckOutcome, CheckStatus, ResponseCheck};
pub use compliance::ComplianceCheck;
pub use domain_id::DomainIdCheck;
pub use safety::SafetyCheck;
pub use schema::SchemaCheck;
pub use validator::{ResponseValidator, ValidatorConfig};
