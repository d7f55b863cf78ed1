//! Transport encoding of links and segments
//!
//! Protobuf messages used by `serialize`/`deserialize`. This schema carries
//! everything a link holds, signatures included, and may evolve on its own:
//! hashing never reads these messages (each link encoding version owns its
//! canonical message set).

use crate::error::Result;
use crate::link::Link;
use crate::signature::Signature;
use crate::types::{LinkHash, LinkMeta, Process};
use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub(crate) struct LinkProto {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(message, optional, tag = "2")]
    pub meta: Option<MetaProto>,
    #[prost(message, repeated, tag = "3")]
    pub signatures: Vec<SignatureProto>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct MetaProto {
    #[prost(message, optional, tag = "1")]
    pub process: Option<ProcessProto>,
    #[prost(string, tag = "2")]
    pub map_id: String,
    #[prost(string, tag = "3")]
    pub action: String,
    #[prost(string, tag = "4")]
    pub step: String,
    #[prost(string, repeated, tag = "5")]
    pub tags: Vec<String>,
    #[prost(double, tag = "6")]
    pub priority: f64,
    #[prost(bytes = "vec", tag = "7")]
    pub prev_link_hash: Vec<u8>,
    #[prost(string, tag = "8")]
    pub client_id: String,
    #[prost(uint32, optional, tag = "9")]
    pub out_degree: Option<u32>,
    #[prost(bytes = "vec", tag = "10")]
    pub data: Vec<u8>,
    #[prost(bytes = "vec", tag = "11")]
    pub metadata: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct ProcessProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub state: String,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct SignatureProto {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(string, tag = "2")]
    pub r#type: String,
    #[prost(string, tag = "3")]
    pub payload_path: String,
    #[prost(bytes = "vec", tag = "4")]
    pub public_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct SegmentProto {
    #[prost(message, optional, tag = "1")]
    pub link: Option<LinkProto>,
    #[prost(bytes = "vec", tag = "2")]
    pub link_hash: Vec<u8>,
}

impl From<&Link> for LinkProto {
    fn from(link: &Link) -> Self {
        Self {
            version: link.version.clone(),
            meta: link.meta.as_ref().map(|meta| MetaProto {
                process: meta.process.as_ref().map(|p| ProcessProto {
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
            signatures: link
                .signatures
                .iter()
                .map(|s| SignatureProto {
                    version: s.version().to_string(),
                    r#type: s.signature_type().to_string(),
                    payload_path: s.payload_path().to_string(),
                    public_key: s.public_key().to_vec(),
                    signature: s.signature().to_vec(),
                })
                .collect(),
        }
    }
}

impl From<LinkProto> for Link {
    fn from(proto: LinkProto) -> Self {
        Link {
            version: proto.version,
            meta: proto.meta.map(|meta| LinkMeta {
                process: meta.process.map(|p| Process {
                    name: p.name,
                    state: p.state,
                }),
                map_id: meta.map_id,
                action: meta.action,
                step: meta.step,
                tags: meta.tags,
                priority: meta.priority,
                prev_link_hash: if meta.prev_link_hash.is_empty() {
                    None
                } else {
                    Some(LinkHash::from_bytes(meta.prev_link_hash))
                },
                client_id: meta.client_id,
                out_degree: meta.out_degree,
                data: meta.data,
                metadata: meta.metadata,
            }),
            signatures: proto
                .signatures
                .into_iter()
                .map(|s| Signature::new(s.version, s.r#type, s.payload_path, s.public_key, s.signature))
                .collect(),
        }
    }
}

/// Encode a link for transport
pub(crate) fn encode_link(link: &Link) -> Vec<u8> {
    LinkProto::from(link).encode_to_vec()
}

/// Decode a link from transport bytes
pub(crate) fn decode_link(bytes: &[u8]) -> Result<Link> {
    Ok(LinkProto::decode(bytes)?.into())
}

/// Encode a segment for transport
pub(crate) fn encode_segment(link: &Link, link_hash: &LinkHash) -> Vec<u8> {
    SegmentProto {
        link: Some(LinkProto::from(link)),
        link_hash: link_hash.as_bytes().to_vec(),
    }
    .encode_to_vec()
}

/// Decode a segment's link and claimed hash from transport bytes
pub(crate) fn decode_segment(bytes: &[u8]) -> Result<(Link, LinkHash)> {
    let proto = SegmentProto::decode(bytes)?;
    let link = proto.link.map(Link::from).unwrap_or_default();
    Ok((link, LinkHash::from_bytes(proto.link_hash)))
}
