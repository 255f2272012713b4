//! Engine response records and content digests.

use crate::core::{now, Error, Hash256, Timestamp};
use crate::model::canonical::content_hash;
use crate::model::payload::Payload;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SENTINEL_PREFIX: &str = "sentinel:";

/// Why an engine produced no usable content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Per-engine timeout or aggregate deadline hit
    Timeout,
    /// Adapter returned an error
    Error,
    /// Adapter task panicked
    Panicked,
    /// Adapter answered under a different engine id
    EngineIdMismatch,
}

impl ErrorKind {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Error => "error",
            ErrorKind::Panicked => "panicked",
            ErrorKind::EngineIdMismatch => "engine_id_mismatch",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(ErrorKind::Timeout),
            "error" => Ok(ErrorKind::Error),
            "panicked" => Ok(ErrorKind::Panicked),
            "engine_id_mismatch" => Ok(ErrorKind::EngineIdMismatch),
            other => Err(Error::SerializationError(format!(
                "unknown error kind: {}",
                other
            ))),
        }
    }
}

/// Content identity of a response.
///
/// A sentinel is a separate variant, so it can never collide with the hash
/// of real content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ContentDigest {
    /// SHA3-256 of the canonical payload
    Content(Hash256),
    /// Fixed marker for a failed engine
    Sentinel(ErrorKind),
}

impl ContentDigest {
    /// Whether this is a sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, ContentDigest::Sentinel(_))
    }

    /// The content hash, if any.
    pub fn hash(&self) -> Option<&Hash256> {
        match self {
            ContentDigest::Content(hash) => Some(hash),
            ContentDigest::Sentinel(_) => None,
        }
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentDigest::Content(hash) => write!(f, "{}", hash),
            ContentDigest::Sentinel(kind) => write!(f, "{}{}", SENTINEL_PREFIX, kind),
        }
    }
}

impl FromStr for ContentDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = s.strip_prefix(SENTINEL_PREFIX) {
            return Ok(ContentDigest::Sentinel(kind.parse()?));
        }
        Hash256::from_hex(s)
            .map(ContentDigest::Content)
            .map_err(|e| Error::SerializationError(format!("invalid digest {}: {}", s, e)))
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_string()
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One engine's answer to one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    /// Engine identifier
    pub engine: String,
    /// Wall-clock latency of the call
    pub latency_ms: u64,
    /// Prompt tokens
    pub tokens_in: u32,
    /// Completion tokens
    pub tokens_out: u32,
    /// Call cost
    pub cost: f64,
    /// Returned content
    pub content: Payload,
    /// Canonical content digest
    pub digest: ContentDigest,
    /// When the response was recorded
    pub timestamp: Timestamp,
}

impl EngineResponse {
    /// Create a response, computing the canonical digest of `content`.
    pub fn new(engine: &str, content: Payload) -> Self {
        let digest = ContentDigest::Content(content_hash(&content));
        Self {
            engine: engine.to_string(),
            latency_ms: 0,
            tokens_in: 0,
            tokens_out: 0,
            cost: 0.0,
            content,
            digest,
            timestamp: now(),
        }
    }

    /// Synthetic response standing in for a failed engine.
    pub fn sentinel(engine: &str, kind: ErrorKind, latency_ms: u64) -> Self {
        Self {
            engine: engine.to_string(),
            latency_ms,
            tokens_in: 0,
            tokens_out: 0,
            cost: 0.0,
            content: Payload::error(kind.as_str()),
            digest: ContentDigest::Sentinel(kind),
            timestamp: now(),
        }
    }

    /// Set latency.
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set token counts.
    pub fn with_tokens(mut self, tokens_in: u32, tokens_out: u32) -> Self {
        self.tokens_in = tokens_in;
        self.tokens_out = tokens_out;
        self
    }

    /// Set cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Whether this is an error sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.digest.is_sentinel()
    }

    /// Error kind of a sentinel.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.digest {
            ContentDigest::Sentinel(kind) => Some(kind),
            ContentDigest::Content(_) => None,
        }
    }

    /// Whether the stored digest still matches the content.
    pub fn digest_matches(&self) -> bool {
        match self.digest {
            ContentDigest::Content(hash) => hash == content_hash(&self.content),
            ContentDigest::Sentinel(_) => true,
        }
    }
}
