//! Consensus Module
//!
//! Redundant-response agreement:
//! - Configurable quorum rule (two identical answers by default)
//! - Deterministic engine priority
//! - Tiebreaker seam with an adapter-backed implementation
//! - Decision procedure producing a proof-carrying result

pub mod engine;
pub mod priority;
pub mod quorum;
pub mod tiebreak;

pub use engine::{Ballot, ConsensusConfig, ConsensusEngine};
pub use priority::EnginePriority;
pub use quorum::QuorumRule;
pub use tiebreak::{
    parse_choice, CandidateSummary, EngineTiebreaker, TiebreakRequest, TiebreakVerdict, Tiebreaker,
};
