//! # Trident - redundant generation with consensus
//!
//! Sends every request to several independent engines at once and accepts
//! an answer only when enough of them agree:
//! - **Policy**: guardrail admission before any engine is called
//! - **Dispatch**: parallel fan-out with per-engine and aggregate deadlines
//! - **Validation**: schema, identifier, convention and safety checks
//! - **Consensus**: 2-of-N quorum over canonical digests, priority
//!   resolution, tiebreaker and priority fallback
//! - **Audit**: signed decision proofs committed to a trace log
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trident::engine::{EngineAdapter, ScriptedEngine};
//! use trident::model::GenerationRequest;
//! use trident::pipeline::{PipelineConfig, TmrPipeline};
//!
//! #[tokio::main]
//! async fn main() -> trident::Result<()> {
//!     let engines: Vec<Arc<dyn EngineAdapter>> = ["engine_a", "engine_b", "engine_c"]
//!         .iter()
//!         .map(|id| Arc::new(ScriptedEngine::text(id, "42", "demo")) as Arc<dyn EngineAdapter>)
//!         .collect();
//!     let pipeline = TmrPipeline::new(PipelineConfig::default(), engines)?;
//!
//!     let result = pipeline.generate(&GenerationRequest::new("What is 6 x 7?")).await;
//!     println!("accepted={} winner={:?}", result.accepted, result.winner_engine);
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod consensus;
pub mod core;
pub mod dispatch;
pub mod engine;
pub mod model;
pub mod monitoring;
pub mod pipeline;
pub mod policy;
pub mod validation;

pub use core::error::{Error, Result};
pub use model::{ConsensusResult, DecisionType, GenerationRequest};
pub use pipeline::{PipelineConfig, TmrPipeline};
