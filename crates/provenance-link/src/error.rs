//! Error types for provenance links

use thiserror::Error;

/// Result type alias using LinkError
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors that can occur while building, encoding, hashing or verifying links
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// The link carries no meta container
    #[error("link meta is missing")]
    MetaMissing,

    /// Meta is present but the process is not
    #[error("link process is missing")]
    ProcessMissing,

    /// The payload producer is not understood by this implementation
    #[error("unknown client id: '{0}'")]
    UnknownClientId(String),

    /// No encoding is registered for the link version
    #[error("unknown link version: '{0}'")]
    UnknownLinkVersion(String),

    /// Signature has no public key attached
    #[error("signature public key is missing")]
    SignaturePublicKeyMissing,

    /// Signature has no signature bytes attached
    #[error("signature bytes are missing")]
    SignatureMissing,

    /// No signature scheme is registered for the signature version
    #[error("unknown signature version: '{0}'")]
    UnknownSignatureVersion(String),

    /// Cryptographic verification failed
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Payload path could not be parsed
    #[error("invalid payload path: {0}")]
    InvalidPayloadPath(String),

    /// Link hash could not be parsed
    #[error("invalid link hash: {0}")]
    InvalidLinkHash(String),

    /// Stored hash disagrees with the recomputed one
    #[error("link hash mismatch: expected '{expected}', got '{actual}'")]
    HashMismatch { expected: String, actual: String },

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Wire decoding error
    #[error("decode error: {0}")]
    Decode(String),

    /// Payload serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error
    #[error("cryptographic error: {0}")]
    Crypto(String),
}

impl From<prost::DecodeError> for LinkError {
    fn from(err: prost::DecodeError) -> Self {
        LinkError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::Serialization(err.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for LinkError {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        LinkError::Crypto(err.to_string())
    }
}

impl From<ed25519_dalek::pkcs8::spki::Error> for LinkError {
    fn from(err: ed25519_dalek::pkcs8::spki::Error) -> Self {
        LinkError::Crypto(err.to_string())
    }
}

impl From<hex::FromHexError> for LinkError {
    fn from(err: hex::FromHexError) -> Self {
        LinkError::InvalidLinkHash(err.to_string())
    }
}
