//! Pipeline Module
//!
//! Wires the stages together:
//! - `PipelineConfig` nesting every stage's configuration
//! - `TmrPipeline` running policy, dispatch, validation, consensus and audit

pub mod config;
pub mod service;

pub use config::{PipelineConfig, DEFAULT_AGENT_ID};
pub use service::TmrPipeline;
