//! Monitoring Module
//!
//! Observability for the pipeline:
//! - Structured logging setup
//! - Pipeline metrics

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, LogFormat, LoggingConfig};
pub use metrics::{Counter, MetricsSnapshot, PipelineMetrics, Sum};
