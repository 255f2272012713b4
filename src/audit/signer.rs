//! Result signing.
//!
//! The signed bytes are the canonical JSON of the value; the envelope also
//! carries the SHA3-256 of those bytes so a verifier can detect tampering
//! before checking the signature.

use crate::core::crypto::{sha3_256, verify, CryptoSuite};
use crate::core::{now, Error, Result};
use crate::model::{canonical_json, SignatureEnvelope};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::VerifyingKey;
use serde_json::Value;

/// Algorithm label of the reference signer.
pub const ED25519_SHA3: &str = "ed25519-sha3-256";

/// Produces signature envelopes.
pub trait Signer: Send + Sync {
    /// Sign the canonical serialization of `value`.
    fn sign(&self, value: &Value) -> Result<SignatureEnvelope>;
}

/// Ed25519 signer.
pub struct Ed25519Signer {
    suite: CryptoSuite,
}

impl Ed25519Signer {
    /// Signer with a fresh random key.
    pub fn new() -> Self {
        Self {
            suite: CryptoSuite::new(),
        }
    }

    /// Signer with a fixed seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            suite: CryptoSuite::from_bytes(seed),
        }
    }

    /// Hex public key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.suite.verifying_key_bytes())
    }
}

impl Default for Ed25519Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, value: &Value) -> Result<SignatureEnvelope> {
        let bytes = canonical_json(value).into_bytes();
        let signature = self.suite.sign(&bytes);
        Ok(SignatureEnvelope {
            algorithm: ED25519_SHA3.to_string(),
            signature: STANDARD.encode(signature),
            object_hash: sha3_256(&bytes).to_hex(),
            timestamp: now(),
            public_key: self.public_key_hex(),
        })
    }
}

/// Check an envelope against `value`.
pub fn verify_envelope(value: &Value, envelope: &SignatureEnvelope) -> Result<()> {
    if envelope.algorithm != ED25519_SHA3 {
        return Err(Error::SignatureVerificationFailed);
    }

    let bytes = canonical_json(value).into_bytes();
    if sha3_256(&bytes).to_hex() != envelope.object_hash {
        return Err(Error::SignatureVerificationFailed);
    }

    let key_bytes: [u8; 32] = hex::decode(&envelope.public_key)
        .map_err(|e| Error::InvalidKeyFormat(e.to_string()))?
        .try_into()
        .map_err(|_| Error::InvalidKeyFormat("public key must be 32 bytes".into()))?;
    let public_key = VerifyingKey::from_bytes(&key_bytes)?;
    let signature = STANDARD
        .decode(&envelope.signature)
        .map_err(|e| Error::InvalidKeyFormat(e.to_string()))?;

    verify(&public_key, &bytes, &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_and_verify() {
        let signer = Ed25519Signer::new();
        let value = json!({"accepted": true, "winner_engine": "engine_a"});
        let envelope = signer.sign(&value).unwrap();

        assert_eq!(envelope.algorithm, ED25519_SHA3);
        assert_eq!(envelope.object_hash.len(), 64);
        assert!(verify_envelope(&value, &envelope).is_ok());
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let signer = Ed25519Signer::new();
        let envelope = signer.sign(&json!({"a": 1, "b": 2})).unwrap();
        let reordered: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert!(verify_envelope(&reordered, &envelope).is_ok());
    }

    #[test]
    fn test_tampering_detected() {
        let signer = Ed25519Signer::new();
        let envelope = signer.sign(&json!({"winner": "engine_a"})).unwrap();
        let err = verify_envelope(&json!({"winner": "engine_b"}), &envelope).unwrap_err();
        assert!(matches!(err, Error::SignatureVerificationFailed));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let value = json!({"winner": "engine_a"});
        let mut envelope = Ed25519Signer::new().sign(&value).unwrap();
        envelope.public_key = Ed25519Signer::new().public_key_hex();
        assert!(verify_envelope(&value, &envelope).is_err());
    }

    #[test]
    fn test_seeded_signer_is_stable() {
        let a = Ed25519Signer::from_seed(&[9u8; 32]);
        let b = Ed25519Signer::from_seed(&[9u8; 32]);
        assert_eq!(a.public_key_hex(), b.public_key_hex());
    }
}
