//! Link encoding versions
//!
//! A link's `version` selects a [`LinkEncoding`]: the canonical bytes that are
//! hashed, the digest applied to them, and the JSON document that payload
//! paths select from when signing. Published encodings are never modified;
//! a new format is a new entry in the registry.

use crate::error::{LinkError, Result};
use crate::link::Link;
use crate::types::LinkHash;
use serde_json::Value;

/// Canonical encoding and hashing rules for one link version
pub trait LinkEncoding: Send + Sync {
    /// Version identifier this encoding is registered under
    fn version(&self) -> &'static str;

    /// Deterministic bytes hashed to produce the link hash.
    ///
    /// Signatures are never part of these bytes.
    fn canonical_bytes(&self, link: &Link) -> Vec<u8>;

    /// Document that signature payload paths select from
    fn document(&self, link: &Link) -> Value;

    /// Digest of canonical bytes
    fn digest(&self, bytes: &[u8]) -> LinkHash;

    /// Output length of [`LinkEncoding::digest`] in bytes
    fn digest_len(&self) -> usize;
}

static ENCODINGS: &[&dyn LinkEncoding] = &[&v1::EncodingV1];

/// Look up the encoding for a link version.
///
/// This is the single failure path for empty or unknown versions.
pub fn resolve(version: &str) -> Result<&'static dyn LinkEncoding> {
    ENCODINGS
        .iter()
        .copied()
        .find(|encoding| encoding.version() == version)
        .ok_or_else(|| LinkError::UnknownLinkVersion(version.to_string()))
}

/// Versions with a registered encoding
pub fn supported_versions() -> impl Iterator<Item = &'static str> {
    ENCODINGS.iter().map(|encoding| encoding.version())
}

pub mod v1 {
    //! Link encoding 1.0.0: protobuf canonical bytes, SHA-256 digest.

    use super::LinkEncoding;
    use crate::link::Link;
    use crate::types::LinkHash;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use prost::Message;
    use serde_json::{json, Value};
    use sha2::{Digest, Sha256};

    pub const VERSION: &str = "1.0.0";

    const DIGEST_LEN: usize = 32;

    #[derive(Debug, Clone, Copy, Default)]
    pub struct EncodingV1;

    // Frozen with this version. Do not share with the transport schema.
    #[derive(Clone, PartialEq, Message)]
    struct CanonicalLink {
        #[prost(string, tag = "1")]
        version: String,
        #[prost(message, optional, tag = "2")]
        meta: Option<CanonicalMeta>,
    }

    #[derive(Clone, PartialEq, Message)]
    struct CanonicalMeta {
        #[prost(message, optional, tag = "1")]
        process: Option<CanonicalProcess>,
        #[prost(string, tag = "2")]
        map_id: String,
        #[prost(string, tag = "3")]
        action: String,
        #[prost(string, tag = "4")]
        step: String,
        #[prost(string, repeated, tag = "5")]
        tags: Vec<String>,
        #[prost(double, tag = "6")]
        priority: f64,
        #[prost(bytes = "vec", tag = "7")]
        prev_link_hash: Vec<u8>,
        #[prost(string, tag = "8")]
        client_id: String,
        #[prost(uint32, optional, tag = "9")]
        out_degree: Option<u32>,
        #[prost(bytes = "vec", tag = "10")]
        data: Vec<u8>,
        #[prost(bytes = "vec", tag = "11")]
        metadata: Vec<u8>,
    }

    #[derive(Clone, PartialEq, Message)]
    struct CanonicalProcess {
        #[prost(string, tag = "1")]
        name: String,
        #[prost(string, tag = "2")]
        state: String,
    }

    impl LinkEncoding for EncodingV1 {
        fn version(&self) -> &'static str {
            VERSION
        }

        fn canonical_bytes(&self, link: &Link) -> Vec<u8> {
            CanonicalLink {
                version: link.version.clone(),
                meta: link.meta.as_ref().map(|meta| CanonicalMeta {
                    process: meta.process.as_ref().map(|p| CanonicalProcess {
                        name: p.name.clone(),
                        state: p.state.clone(),
                    }),
                    map_id: meta.map_id.clone(),
                    action: meta.action.clone(),
                    step: meta.step.clone(),
                    tags: meta.tags.clone(),
                    priority: meta.priority,
                    prev_link_hash: meta
                        .prev_link_hash
                        .as_ref()
                        .map(|h| h.as_bytes().to_vec())
                        .unwrap_or_default(),
                    client_id: meta.client_id.clone(),
                    out_degree: meta.out_degree,
                    data: meta.data.clone(),
                    metadata: meta.metadata.clone(),
                }),
            }
            .encode_to_vec()
        }

        fn document(&self, link: &Link) -> Value {
            let meta = match &link.meta {
                None => Value::Null,
                Some(meta) => json!({
                    "process": meta.process.as_ref().map(|p| json!({
                        "name": p.name,
                        "state": p.state,
                    })),
                    "mapId": meta.map_id,
                    "action": meta.action,
                    "step": meta.step,
                    "tags": meta.tags,
                    "priority": meta.priority,
                    "prevLinkHash": meta
                        .prev_link_hash
                        .as_ref()
                        .map(|h| STANDARD.encode(h.as_bytes()))
                        .unwrap_or_default(),
                    "clientId": meta.client_id,
                    "outDegree": meta.out_degree,
                    "data": STANDARD.encode(&meta.data),
                    "metadata": STANDARD.encode(&meta.metadata),
                }),
            };

            let signatures: Vec<Value> = link
                .signatures
                .iter()
                .map(|s| {
                    json!({
                        "version": s.version(),
                        "type": s.signature_type(),
                        "payloadPath": s.payload_path(),
                        "publicKey": STANDARD.encode(s.public_key()),
                        "signature": STANDARD.encode(s.signature()),
                    })
                })
                .collect();

            json!({
                "version": link.version,
                "meta": meta,
                "signatures": signatures,
            })
        }

        fn digest(&self, bytes: &[u8]) -> LinkHash {
            LinkHash::from_bytes(Sha256::digest(bytes).to_vec())
        }

        fn digest_len(&self) -> usize {
            DIGEST_LEN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LinkMeta, Process};

    fn link_with_meta(meta: Option<LinkMeta>) -> Link {
        Link {
            version: v1::VERSION.into(),
            meta,
            signatures: vec![],
        }
    }

    #[test]
    fn test_resolve_known_version() {
        let encoding = resolve("1.0.0").unwrap();
        assert_eq!(encoding.version(), "1.0.0");
        assert_eq!(encoding.digest_len(), 32);
    }

    #[test]
    fn test_resolve_unknown_and_empty_versions() {
        assert_eq!(
            resolve("0.42.0").err(),
            Some(LinkError::UnknownLinkVersion("0.42.0".into()))
        );
        assert_eq!(
            resolve("").err(),
            Some(LinkError::UnknownLinkVersion(String::new()))
        );
    }

    #[test]
    fn test_supported_versions() {
        let versions: Vec<_> = supported_versions().collect();
        assert_eq!(versions, vec!["1.0.0"]);
    }

    #[test]
    fn test_digest_is_sha256() {
        let encoding = resolve(v1::VERSION).unwrap();
        // SHA-256 of the empty string
        assert_eq!(
            encoding.digest(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_absent_and_empty_meta_differ() {
        let encoding = resolve(v1::VERSION).unwrap();
        let absent = encoding.canonical_bytes(&link_with_meta(None));
        let empty = encoding.canonical_bytes(&link_with_meta(Some(LinkMeta::default())));

        assert_ne!(absent, empty);
    }

    #[test]
    fn test_canonical_bytes_ignore_signatures() {
        let encoding = resolve(v1::VERSION).unwrap();
        let mut link = link_with_meta(Some(LinkMeta {
            process: Some(Process::new("p1")),
            map_id: "m1".into(),
            ..Default::default()
        }));
        let before = encoding.canonical_bytes(&link);

        link.signatures.push(crate::signature::Signature::new(
            "1.0.0",
            "ed25519",
            "[version,meta]",
            b"key".to_vec(),
            b"sig".to_vec(),
        ));

        assert_eq!(encoding.canonical_bytes(&link), before);
    }

    #[test]
    fn test_document_shape() {
        let encoding = resolve(v1::VERSION).unwrap();
        let link = link_with_meta(Some(LinkMeta {
            process: Some(Process::new("p1").with_state("s")),
            map_id: "m1".into(),
            tags: vec!["t".into()],
            data: b"{}".to_vec(),
            ..Default::default()
        }));

        let doc = encoding.document(&link);
        assert_eq!(doc["version"], "1.0.0");
        assert_eq!(doc["meta"]["mapId"], "m1");
        assert_eq!(doc["meta"]["process"]["state"], "s");
        assert_eq!(doc["meta"]["data"], "e30=");
        assert_eq!(doc["meta"]["outDegree"], Value::Null);
        assert_eq!(doc["signatures"], Value::Array(vec![]));

        let doc = encoding.document(&link_with_meta(None));
        assert_eq!(doc["meta"], Value::Null);
    }
}
