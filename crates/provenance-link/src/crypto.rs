//! Cryptographic primitives for link signing
//!
//! Ed25519 keys. Public keys travel inside link signatures as PEM-encoded
//! SubjectPublicKeyInfo text.
//!
//! Key types:
//! - `KeyPair`: Ed25519 key pair for signing
//! - `PublicKey`: Ed25519 public key for verification

use crate::error::{LinkError, Result};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// Algorithm name recorded in signatures produced by [`KeyPair`]
pub const ED25519: &str = "ed25519";

/// Ed25519 key pair for signing links
#[derive(Clone)]
pub struct KeyPair {
    /// Ed25519 signing key (private)
    signing_key: SigningKey,
    /// Ed25519 verifying key (public)
    verifying_key: VerifyingKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("signing_key", &"[redacted]")
            .field("verifying_key", &hex::encode(self.verifying_key.as_bytes()))
            .finish()
    }
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Create a key pair from an existing signing key
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create a key pair from raw secret key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(bytes))
    }

    /// Algorithm name
    pub fn algorithm(&self) -> &'static str {
        ED25519
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.verifying_key,
        }
    }

    /// Get the raw signing key bytes
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Get the raw verifying key bytes
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign a message, returning the 64 raw signature bytes
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

/// Ed25519 public key for verification
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey")
            .field(&hex::encode(self.verifying_key.as_bytes()))
            .finish()
    }
}

impl PublicKey {
    /// Create a public key from raw bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let verifying_key = VerifyingKey::from_bytes(bytes)?;
        Ok(Self { verifying_key })
    }

    /// Decode a PEM-encoded public key
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let pem = std::str::from_utf8(pem)
            .map_err(|e| LinkError::Crypto(format!("public key is not PEM text: {}", e)))?;
        let verifying_key = VerifyingKey::from_public_key_pem(pem)?;
        Ok(Self { verifying_key })
    }

    /// Get the raw verifying key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Encode as PEM text bytes
    pub fn to_pem(&self) -> Result<Vec<u8>> {
        let pem = self.verifying_key.to_public_key_pem(LineEnding::LF)?;
        Ok(pem.into_bytes())
    }

    /// Verify a raw signature over a message.
    ///
    /// Malformed signatures verify as false.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let signature = Signature::from_bytes(&bytes);
        self.verifying_key.verify(message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"hello");

        // Ed25519 signatures are 64 bytes
        assert_eq!(sig.len(), 64);
        assert!(kp.public_key().verify(b"hello", &sig));
        assert!(!kp.public_key().verify(b"hello!", &sig));
    }

    #[test]
    fn test_verification_fails_with_wrong_key() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();

        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn test_malformed_signature_is_false() {
        let kp = KeyPair::generate();
        assert!(!kp.public_key().verify(b"message", &[0u8; 10]));
        assert!(!kp.public_key().verify(b"message", &[]));
    }

    #[test]
    fn test_pem_roundtrip() {
        let pk = KeyPair::generate().public_key();
        let pem = pk.to_pem().unwrap();

        assert!(pem.starts_with(b"-----BEGIN PUBLIC KEY-----"));
        assert_eq!(PublicKey::from_pem(&pem).unwrap(), pk);
    }

    #[test]
    fn test_from_pem_rejects_garbage() {
        assert!(matches!(
            PublicKey::from_pem(b"-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n"),
            Err(LinkError::Crypto(_))
        ));
        assert!(matches!(
            PublicKey::from_pem(&[0xff, 0xfe]),
            Err(LinkError::Crypto(_))
        ));
    }

    #[test]
    fn test_keypair_from_bytes() {
        let kp1 = KeyPair::generate();
        let bytes = kp1.signing_key_bytes();

        let kp2 = KeyPair::from_bytes(&bytes);
        assert_eq!(kp2.signing_key_bytes(), bytes);
        assert_eq!(kp2.verifying_key_bytes(), kp1.verifying_key_bytes());
    }

    #[test]
    fn test_public_key_from_bytes() {
        let kp = KeyPair::generate();
        let pk = PublicKey::from_bytes(&kp.verifying_key_bytes()).unwrap();
        assert_eq!(pk, kp.public_key());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = KeyPair::generate();
        let debug = format!("{:?}", kp);
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains(&hex::encode(kp.signing_key_bytes())));
    }
}
