//! Audit Module
//!
//! Evidence for every admitted request:
//! - `Signer` seam with an Ed25519 reference signer
//! - `TraceLog` seam with a bounded in-memory log
//! - `EvidenceAuditor` tying them together

pub mod auditor;
pub mod config;
pub mod signer;
pub mod trace;

pub use auditor::{verify_result, EvidenceAuditor};
pub use config::AuditConfig;
pub use signer::{verify_envelope, Ed25519Signer, Signer, ED25519_SHA3};
pub use trace::{InMemoryTraceLog, TraceFilter, TraceLog, TraceRecord, TraceStatus};
