//! Engine Module
//!
//! Backend generators behind a common adapter seam:
//! - `EngineAdapter` trait, pricing and token estimates
//! - Content filters for adapter output
//! - Scripted engine for tests and demos
//! - Health probes

pub mod adapter;
pub mod filters;
pub mod health;
pub mod scripted;

pub use adapter::{estimate_tokens, EngineAdapter, EngineInfo, TokenPricing};
pub use filters::ContentFilter;
pub use health::{probe_engines, EngineHealth, EngineStatus, HealthReport, ServiceStatus};
pub use scripted::{ScriptedBehavior, ScriptedEngine};
