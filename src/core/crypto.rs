//! Cryptographic primitives.
//!
//! Provides Ed25519 signing/verification and SHA3-256 hashing.

use crate::core::{Error, Hash256, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha3::{Digest, Sha3_256};

/// Ed25519 key pair used to seal decisions.
#[derive(Clone)]
pub struct CryptoSuite {
    signing_key: SigningKey,
}

impl CryptoSuite {
    /// Create a new CryptoSuite with a random key pair.
    pub fn new() -> Self {
        use rand::RngCore;
        let mut csprng = rand::rngs::OsRng;
        let mut secret_key_bytes = [0u8; 32];
        csprng.fill_bytes(&mut secret_key_bytes);
        let signing_key = SigningKey::from_bytes(&secret_key_bytes);
        Self { signing_key }
    }

    /// Create from existing signing key bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Get the verifying (public) key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Get the verifying key bytes.
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Verify a signature made by this suite.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        verify(&self.verifying_key(), message, signature)
    }
}

impl Default for CryptoSuite {
    fn default() -> Self {
        Self::new()
    }
}

/// Verify a signature with a public key.
pub fn verify(public_key: &VerifyingKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| Error::InvalidKeyFormat("Invalid signature length".into()))?;
    let sig = Signature::from_bytes(&sig_bytes);
    public_key.verify(message, &sig)?;
    Ok(())
}

/// Compute SHA3-256 hash of data.
pub fn sha3_256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash256::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let suite = CryptoSuite::new();
        let message = b"consensus result";
        let signature = suite.sign(message);
        assert!(suite.verify(message, &signature).is_ok());
    }

    #[test]
    fn test_verify_wrong_message() {
        let suite = CryptoSuite::new();
        let signature = suite.sign(b"consensus result");
        assert!(suite.verify(b"tampered result", &signature).is_err());
    }

    #[test]
    fn test_verify_truncated_signature() {
        let suite = CryptoSuite::new();
        let err = suite.verify(b"msg", &[0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::InvalidKeyFormat(_)));
    }

    #[test]
    fn test_sha3_256_deterministic() {
        assert_eq!(sha3_256(b"test data"), sha3_256(b"test data"));
        assert_ne!(sha3_256(b"data1"), sha3_256(b"data2"));
    }

    #[test]
    fn test_from_bytes_same_key() {
        let suite = CryptoSuite::from_bytes(&[3u8; 32]);
        let other = CryptoSuite::from_bytes(&[3u8; 32]);
        assert_eq!(suite.verifying_key_bytes(), other.verifying_key_bytes());
    }
}
