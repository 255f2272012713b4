//! Dispatch Module
//!
//! Concurrent fan-out of a request to every configured engine.

pub mod config;
pub mod dispatcher;

pub use config::DispatchConfig;
pub use dispatcher::{DispatchReport, ParallelDispatcher};
