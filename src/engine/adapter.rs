//! EngineAdapter trait definition.
//!
//! Core trait that every generation backend must implement.

use crate::core::Result;
use crate::model::{EngineResponse, GenerationRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptive information about an engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Engine id
    pub id: String,
    /// Model identifier
    pub model: String,
    /// Vendor name
    pub vendor: String,
}

impl EngineInfo {
    /// Create engine info.
    pub fn new(id: &str, model: &str, vendor: &str) -> Self {
        Self {
            id: id.to_string(),
            model: model.to_string(),
            vendor: vendor.to_string(),
        }
    }
}

/// Per-token pricing of a backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenPricing {
    /// Price per prompt token
    pub input_per_token: f64,
    /// Price per completion token
    pub output_per_token: f64,
    /// Vendor multiplier applied to the sum
    pub multiplier: f64,
}

impl Default for TokenPricing {
    fn default() -> Self {
        Self {
            input_per_token: 0.000_01,
            output_per_token: 0.000_03,
            multiplier: 1.0,
        }
    }
}

impl TokenPricing {
    /// Pricing for a local model.
    pub fn free() -> Self {
        Self {
            input_per_token: 0.0,
            output_per_token: 0.0,
            multiplier: 0.0,
        }
    }

    /// Set the vendor multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Cost of one call.
    pub fn cost(&self, tokens_in: u32, tokens_out: u32) -> f64 {
        (tokens_in as f64 * self.input_per_token + tokens_out as f64 * self.output_per_token)
            * self.multiplier
    }
}

/// Whitespace token estimate of the template plus all inputs.
pub fn estimate_tokens(request: &GenerationRequest) -> u32 {
    let template = request.template.split_whitespace().count();
    let inputs: usize = request
        .inputs
        .values()
        .map(|v| match v {
            Value::String(s) => s.split_whitespace().count(),
            other => other.to_string().split_whitespace().count(),
        })
        .sum();
    (template + inputs) as u32
}

/// A generation backend.
///
/// Implementations may fail freely: the dispatcher converts any `Err`,
/// timeout or panic into a sentinel response, so nothing an adapter does can
/// abort the request.
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Stable engine id used for grouping, priority and proofs.
    fn id(&self) -> &str;

    /// Model and vendor details.
    fn info(&self) -> EngineInfo {
        EngineInfo::new(self.id(), "unknown", "unknown")
    }

    /// Run the request against the backend.
    async fn generate(&self, request: &GenerationRequest) -> Result<EngineResponse>;

    /// Health check for the backend.
    async fn health_check(&self) -> bool {
        true
    }
}
