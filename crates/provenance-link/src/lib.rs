//! # Provenance Link
//!
//! Versioned, content-addressable provenance links: build them, hash them,
//! sign them and exchange them with other implementations that agree
//! byte-for-byte on what each format version means.
//!
//! ## Key Concepts
//!
//! - **Link**: process/map metadata plus opaque `data` and `metadata` payloads
//! - **Link version**: selects canonical bytes, digest and signing document
//! - **Client id**: identifies the producing implementation; gates payload decoding
//! - **Signature**: covers the bytes selected by a payload path; versioned on its own
//! - **Segment**: an immutable (link, hash) snapshot
//!
//! ## Check Ordering
//!
//! 1. Meta presence is checked before anything else
//! 2. Client id is checked before the link version (payload accessors)
//! 3. Signature material is checked before the signature version, which is
//!    checked before the cryptographic verification

pub mod canonical;
pub mod codec;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod link;
pub mod payload_path;
pub mod segment;
pub mod signature;
pub mod types;
mod wire;

pub use codec::{JsonCodec, PayloadCodec};
pub use crypto::{KeyPair, PublicKey};
pub use encoding::LinkEncoding;
pub use error::{LinkError, Result};
pub use link::{deserialize, Link, LinkBuilder};
pub use payload_path::PayloadPath;
pub use segment::{deserialize_segment, Segment};
pub use signature::{Signature, SignatureScheme};
pub use types::{LinkHash, LinkMeta, Process};

/// Client id of this implementation
///
/// Set on every link built here; payloads of links carrying another client
/// id are not decoded.
pub const CLIENT_ID: &str = "github.com/provenance-rs/provenance-link";

/// Link encoding version used for new links
pub const LINK_VERSION: &str = encoding::v1::VERSION;

/// Signature scheme version used for new signatures
pub const SIGNATURE_VERSION: &str = signature::v1::VERSION;

/// Payload path signed when none is given
pub const DEFAULT_PAYLOAD_PATH: &str = "[version,meta]";

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_values_are_send_and_sync() {
        assert_send_sync::<Link>();
        assert_send_sync::<Signature>();
        assert_send_sync::<Segment>();
        assert_send_sync::<&'static dyn LinkEncoding>();
        assert_send_sync::<&'static dyn PayloadCodec>();
        assert_send_sync::<&'static dyn SignatureScheme>();
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), VERSION);
        assert!(!VERSION.is_empty());
    }
}
