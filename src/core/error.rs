//! Error types for trident.

use thiserror::Error;

/// Result type alias for trident operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the consensus pipeline.
///
/// None of these reach the caller of [`crate::pipeline::TmrPipeline::generate`]:
/// engine errors become sentinel responses, tiebreaker errors become a
/// priority fallback, and audit errors are logged against the trace.
#[derive(Error, Debug)]
pub enum Error {
    // Engine errors
    #[error("Engine {engine} timed out after {timeout_ms}ms")]
    EngineTimeout { engine: String, timeout_ms: u64 },

    #[error("Engine {engine} failed: {message}")]
    Engine { engine: String, message: String },

    #[error("Engine {engine} is unavailable")]
    EngineUnavailable { engine: String },

    #[error("Potential jailbreak attempt detected: {0}")]
    JailbreakDetected(String),

    // Policy errors
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    // Tiebreaker errors
    #[error("Tiebreaker failed: {0}")]
    Tiebreaker(String),

    #[error("Tiebreaker timed out after {0}ms")]
    TiebreakerTimeout(u64),

    // Cryptography errors
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    // Trace errors
    #[error("Trace not found: {0}")]
    TraceNotFound(String),

    #[error("Trace already closed: {0}")]
    TraceClosed(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for Error {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        Error::SignatureVerificationFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_timeout_display() {
        let err = Error::EngineTimeout {
            engine: "engine_a".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(err.to_string(), "Engine engine_a timed out after 30000ms");
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{bad");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
