//! Tiebreaker seam.
//!
//! Consulted only when no quorum group exists. The tiebreaker sees a short
//! summary of every qualifying candidate and answers with free text; the
//! consensus engine reads the chosen engine id out of that text.

use crate::core::{new_id, Error, Result};
use crate::engine::EngineAdapter;
use crate::model::payload::RESPONSE_FIELD;
use crate::model::{GenerationControls, GenerationRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Characters of payload shown per candidate.
pub const PREVIEW_CHARS: usize = 200;

/// Output budget of a tiebreak call.
pub const TIEBREAK_MAX_TOKENS: u32 = 100;

/// Payload field carrying the tiebreaker's answer.
pub const DECISION_FIELD: &str = "decision";

const TIEBREAK_TEMPLATE: &str = "Select the best response from the following options based on \
quality, validation score, and coherence. Answer with the engine id of your choice: {candidates}";

/// One candidate as shown to the tiebreaker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub engine: String,
    /// Truncated payload
    pub content_preview: String,
    pub validation_score: f64,
    pub latency_ms: u64,
    pub cost: f64,
}

/// Input of a tiebreak call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TiebreakRequest {
    /// Correlates the call with the decision proof
    pub correlation_id: String,
    pub candidates: Vec<CandidateSummary>,
}

impl TiebreakRequest {
    /// Create with a fresh correlation id.
    pub fn new(candidates: Vec<CandidateSummary>) -> Self {
        Self {
            correlation_id: new_id(),
            candidates,
        }
    }

    /// Candidate engine ids.
    pub fn engine_ids(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.engine.as_str()).collect()
    }
}

/// Raw answer of a tiebreaker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TiebreakVerdict {
    /// Tiebreaker id
    pub tiebreaker: String,
    /// Free-text decision
    pub decision: String,
}

/// Subordinate decision capability.
#[async_trait]
pub trait Tiebreaker: Send + Sync {
    /// Tiebreaker id.
    fn id(&self) -> &str;

    /// Answer a tiebreak request.
    async fn choose(&self, request: &TiebreakRequest) -> Result<TiebreakVerdict>;
}

/// Find the candidate named earliest in `decision`.
///
/// A name only counts as a whole word, so `engine_a` is not found inside
/// `engine_ab`.
pub fn parse_choice<'a>(decision: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|candidate| first_word_match(decision, candidate).map(|pos| (pos, *candidate)))
        .min_by(|(pa, a), (pb, b)| pa.cmp(pb).then_with(|| b.len().cmp(&a.len())))
        .map(|(_, candidate)| candidate)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn first_word_match(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.match_indices(needle).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

/// Tiebreaker backed by an engine adapter.
pub struct EngineTiebreaker {
    engine: Arc<dyn EngineAdapter>,
}

impl EngineTiebreaker {
    /// Wrap an adapter.
    pub fn new(engine: Arc<dyn EngineAdapter>) -> Self {
        Self { engine }
    }

    /// Request sent to the wrapped engine.
    pub fn build_request(request: &TiebreakRequest) -> GenerationRequest {
        GenerationRequest::new(TIEBREAK_TEMPLATE)
            .with_id(&request.correlation_id)
            .with_input("candidates", &request.candidates)
            .with_controls(GenerationControls::deterministic(TIEBREAK_MAX_TOKENS))
    }
}

#[async_trait]
impl Tiebreaker for EngineTiebreaker {
    fn id(&self) -> &str {
        self.engine.id()
    }

    async fn choose(&self, request: &TiebreakRequest) -> Result<TiebreakVerdict> {
        let response = self.engine.generate(&Self::build_request(request)).await?;
        let decision = response
            .content
            .get_str(DECISION_FIELD)
            .or_else(|| response.content.get_str(RESPONSE_FIELD))
            .ok_or_else(|| {
                Error::Tiebreaker(format!("{} returned no decision text", self.engine.id()))
            })?;

        Ok(TiebreakVerdict {
            tiebreaker: self.engine.id().to_string(),
            decision: decision.to_string(),
        })
    }
}
