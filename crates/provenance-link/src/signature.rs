//! Link signatures
//!
//! A [`Signature`] covers the bytes a link produces for one payload path.
//! Signature versions are a separate axis from link versions: the link's
//! version decides the document being selected from, the signature version
//! decides how the selection becomes a message and how it is verified.

use crate::crypto::PublicKey;
use crate::error::{LinkError, Result};
use crate::link::Link;
use crate::payload_path::PayloadPath;
use serde_json::Value;
use tracing::warn;

/// Message construction and verification rules for one signature version
pub trait SignatureScheme: Send + Sync {
    /// Version identifier this scheme is registered under
    fn version(&self) -> &'static str;

    /// Bytes that get signed for the selected payload
    fn message(&self, document: &Value, payload_path: &PayloadPath) -> Result<Vec<u8>>;

    /// Verify `signature` over `message` with a transport-encoded public key
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool>;
}

static SCHEMES: &[&dyn SignatureScheme] = &[&v1::SchemeV1];

/// Look up the scheme for a signature version
pub fn resolve_scheme(version: &str) -> Result<&'static dyn SignatureScheme> {
    SCHEMES
        .iter()
        .copied()
        .find(|scheme| scheme.version() == version)
        .ok_or_else(|| LinkError::UnknownSignatureVersion(version.to_string()))
}

pub mod v1 {
    //! Signature scheme 1.0.0: SHA-256 of the canonical JSON selection,
    //! Ed25519 over that digest, PEM public keys.

    use super::SignatureScheme;
    use crate::canonical;
    use crate::crypto::PublicKey;
    use crate::error::Result;
    use crate::payload_path::PayloadPath;
    use serde_json::Value;
    use sha2::{Digest, Sha256};

    pub const VERSION: &str = "1.0.0";

    #[derive(Debug, Clone, Copy, Default)]
    pub struct SchemeV1;

    impl SignatureScheme for SchemeV1 {
        fn version(&self) -> &'static str {
            VERSION
        }

        fn message(&self, document: &Value, payload_path: &PayloadPath) -> Result<Vec<u8>> {
            let payload = payload_path.select(document);
            let bytes = canonical::to_vec(&payload)?;
            Ok(Sha256::digest(&bytes).to_vec())
        }

        fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool> {
            let key = PublicKey::from_pem(public_key)?;
            Ok(key.verify(message, signature))
        }
    }
}

/// Signature attached to a link
///
/// Accessors return empty values for unset fields; a signature may be
/// partially populated until it is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    version: String,
    signature_type: String,
    payload_path: String,
    public_key: Vec<u8>,
    signature: Vec<u8>,
}

impl Signature {
    /// Create a signature record
    pub fn new(
        version: impl Into<String>,
        signature_type: impl Into<String>,
        payload_path: impl Into<String>,
        public_key: Vec<u8>,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            version: version.into(),
            signature_type: signature_type.into(),
            payload_path: payload_path.into(),
            public_key,
            signature,
        }
    }

    /// Signature scheme version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Algorithm name (descriptive only)
    pub fn signature_type(&self) -> &str {
        &self.signature_type
    }

    /// Payload path the signature covers
    pub fn payload_path(&self) -> &str {
        &self.payload_path
    }

    /// Transport-encoded (PEM) public key
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Raw signature bytes
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Validate this signature against a link.
    ///
    /// Checks run in a fixed order: public key present, signature present,
    /// known signature version, then the cryptographic check.
    pub fn validate(&self, link: &Link) -> Result<()> {
        if self.public_key.is_empty() {
            return Err(LinkError::SignaturePublicKeyMissing);
        }
        if self.signature.is_empty() {
            return Err(LinkError::SignatureMissing);
        }

        let scheme = resolve_scheme(&self.version)?;
        let message = link.signed_bytes(&self.version, &self.payload_path)?;

        if !scheme.verify(&message, &self.signature, &self.public_key)? {
            warn!(
                version = %self.version,
                payload_path = %self.payload_path,
                "SECURITY: link signature verification failed"
            );
            return Err(LinkError::SignatureInvalid);
        }

        Ok(())
    }

    /// Decode the public key carried by this signature
    pub fn decoded_public_key(&self) -> Result<PublicKey> {
        if self.public_key.is_empty() {
            return Err(LinkError::SignaturePublicKeyMissing);
        }
        PublicKey::from_pem(&self.public_key)
    }
}
