//! Data model
//!
//! Values flowing through one pipeline invocation:
//! - Generation request (caller-owned, read-only)
//! - Engine responses with canonical content digests
//! - Validation reports
//! - Consensus result with its decision proof

pub mod canonical;
pub mod payload;
pub mod report;
pub mod request;
pub mod response;
pub mod result;

pub use canonical::{canonical_json, canonicalize, content_hash};
pub use payload::Payload;
pub use report::ValidationReport;
pub use request::{GenerationControls, GenerationRequest};
pub use response::{ContentDigest, EngineResponse, ErrorKind};
pub use result::{
    ConsensusResult, ConsideredEngine, DecisionProof, DecisionType, ExcludedCandidate,
    ReasonCode, SignatureEnvelope, TiebreakRecord, WinnerSelection,
};
