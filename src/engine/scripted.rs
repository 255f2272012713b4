//! Deterministic scripted engine.
//!
//! Stands in for a real backend in tests, benches and demos: returns a fixed
//! payload after a simulated latency, or fails in a chosen way.

use crate::core::{Error, Result};
use crate::engine::adapter::{estimate_tokens, EngineAdapter, EngineInfo, TokenPricing};
use crate::engine::filters::ContentFilter;
use crate::model::payload::RESPONSE_FIELD;
use crate::model::{EngineResponse, GenerationRequest, Payload};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// What a scripted engine does when called.
#[derive(Clone, Debug)]
pub enum ScriptedBehavior {
    /// Return this payload
    Respond(Payload),
    /// Return an adapter error with this message
    Fail(String),
    /// Never complete
    Hang,
    /// Panic inside the call
    Panic,
}

/// Scripted engine adapter.
pub struct ScriptedEngine {
    info: EngineInfo,
    behavior: ScriptedBehavior,
    latency: Duration,
    pricing: TokenPricing,
    filter: Option<ContentFilter>,
    healthy: AtomicBool,
    calls: AtomicU64,
}

impl ScriptedEngine {
    /// Engine that answers with `payload`.
    pub fn responding(id: &str, payload: Payload) -> Self {
        Self::new(id, ScriptedBehavior::Respond(payload))
    }

    /// Engine that answers `{response, model}`.
    pub fn text(id: &str, response: &str, model: &str) -> Self {
        Self::responding(id, Payload::text(response, model))
    }

    /// Engine that fails with `message`.
    pub fn failing(id: &str, message: &str) -> Self {
        Self::new(id, ScriptedBehavior::Fail(message.to_string()))
    }

    /// Engine that never answers.
    pub fn hanging(id: &str) -> Self {
        Self::new(id, ScriptedBehavior::Hang)
    }

    /// Engine that panics.
    pub fn panicking(id: &str) -> Self {
        Self::new(id, ScriptedBehavior::Panic)
    }

    /// Create with an explicit behavior.
    pub fn new(id: &str, behavior: ScriptedBehavior) -> Self {
        Self {
            info: EngineInfo::new(id, "scripted", "local"),
            behavior,
            latency: Duration::ZERO,
            pricing: TokenPricing::default(),
            filter: None,
            healthy: AtomicBool::new(true),
            calls: AtomicU64::new(0),
        }
    }

    /// Set the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set model and vendor.
    pub fn with_model(mut self, model: &str, vendor: &str) -> Self {
        self.info.model = model.to_string();
        self.info.vendor = vendor.to_string();
        self
    }

    /// Set pricing.
    pub fn with_pricing(mut self, pricing: TokenPricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Run the response text through a content filter.
    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Mark the engine healthy or not.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, request: &GenerationRequest, payload: &Payload) -> Result<EngineResponse> {
        let mut content = payload.clone();
        if let (Some(filter), Some(text)) = (&self.filter, payload.response_text()) {
            let filtered = filter.apply(text)?;
            content.insert(RESPONSE_FIELD, filtered);
        }

        let tokens_in = estimate_tokens(request);
        let tokens_out = content.to_value().to_string().split_whitespace().count() as u32;
        let cost = self.pricing.cost(tokens_in, tokens_out);

        Ok(EngineResponse::new(&self.info.id, content)
            .with_latency(self.latency.as_millis() as u64)
            .with_tokens(tokens_in, tokens_out)
            .with_cost(cost))
    }
}

#[async_trait]
impl EngineAdapter for ScriptedEngine {
    fn id(&self) -> &str {
        &self.info.id
    }

    fn info(&self) -> EngineInfo {
        self.info.clone()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<EngineResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match &self.behavior {
            ScriptedBehavior::Respond(payload) => self.respond(request, payload),
            ScriptedBehavior::Fail(message) => Err(Error::Engine {
                engine: self.info.id.clone(),
                message: message.clone(),
            }),
            ScriptedBehavior::Hang => std::future::pending().await,
            ScriptedBehavior::Panic => panic!("scripted engine {} panicked", self.info.id),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}
