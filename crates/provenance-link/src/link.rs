//! Link model
//!
//! A link is a versioned unit of provenance metadata plus opaque payloads.
//! Everything that depends on how the link is encoded goes through the
//! version registry ([`crate::encoding`]); everything that interprets the
//! opaque payloads goes through the codec registry ([`crate::codec`]).
//!
//! Precondition checks always run in the same order:
//!
//! 1. meta present
//! 2. client id understood (payload accessors only)
//! 3. version known
//!
//! Links are mutable. A hash is a function of the link's state at the time
//! it is computed; use [`Link::segmentify`] to capture a stable snapshot.

use crate::codec;
use crate::crypto::KeyPair;
use crate::encoding;
use crate::error::{LinkError, Result};
use crate::payload_path::PayloadPath;
use crate::segment::Segment;
use crate::signature::{self, Signature};
use crate::types::{LinkHash, LinkMeta, Process};
use crate::wire;
use crate::{CLIENT_ID, DEFAULT_PAYLOAD_PATH, LINK_VERSION, SIGNATURE_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A single versioned, content-addressable unit of provenance data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    /// Encoding version; selects hashing and signing rules
    pub version: String,

    /// Metadata container (None is a distinct, always-checked state)
    pub meta: Option<LinkMeta>,

    /// Ordered signatures attached to this link
    pub signatures: Vec<Signature>,
}

/// Which opaque payload field to access
#[derive(Debug, Clone, Copy)]
enum PayloadField {
    Data,
    Metadata,
}

impl Link {
    /// Create a builder for constructing links
    pub fn builder(process: impl Into<String>, map_id: impl Into<String>) -> LinkBuilder {
        LinkBuilder::new(process, map_id)
    }

    fn meta(&self) -> Result<&LinkMeta> {
        self.meta.as_ref().ok_or(LinkError::MetaMissing)
    }

    fn meta_mut(&mut self) -> Result<&mut LinkMeta> {
        self.meta.as_mut().ok_or(LinkError::MetaMissing)
    }

    // =========================================================================
    // Meta accessors
    // =========================================================================

    /// Process this link belongs to
    pub fn process(&self) -> Result<&Process> {
        self.meta()?.process.as_ref().ok_or(LinkError::ProcessMissing)
    }

    /// Map identifier
    pub fn map_id(&self) -> Result<&str> {
        Ok(&self.meta()?.map_id)
    }

    /// Action this link represents
    pub fn action(&self) -> Result<&str> {
        Ok(&self.meta()?.action)
    }

    /// Process step
    pub fn step(&self) -> Result<&str> {
        Ok(&self.meta()?.step)
    }

    /// Ordered tags
    pub fn tags(&self) -> Result<&[String]> {
        Ok(&self.meta()?.tags)
    }

    /// Priority among links of the same map
    pub fn priority(&self) -> Result<f64> {
        Ok(self.meta()?.priority)
    }

    /// Hash of the parent link
    pub fn prev_link_hash(&self) -> Result<Option<&LinkHash>> {
        Ok(self.meta()?.prev_link_hash.as_ref())
    }

    /// Implementation that produced this link
    pub fn client_id(&self) -> Result<&str> {
        Ok(&self.meta()?.client_id)
    }

    /// Maximum number of children
    pub fn out_degree(&self) -> Result<Option<u32>> {
        Ok(self.meta()?.out_degree)
    }

    // =========================================================================
    // Meta mutators
    // =========================================================================

    /// Set the process
    pub fn set_process(&mut self, process: Process) -> Result<()> {
        self.meta_mut()?.process = Some(process);
        Ok(())
    }

    /// Set the map identifier
    pub fn set_map_id(&mut self, map_id: impl Into<String>) -> Result<()> {
        self.meta_mut()?.map_id = map_id.into();
        Ok(())
    }

    /// Set the action
    pub fn set_action(&mut self, action: impl Into<String>) -> Result<()> {
        self.meta_mut()?.action = action.into();
        Ok(())
    }

    /// Set the process step
    pub fn set_step(&mut self, step: impl Into<String>) -> Result<()> {
        self.meta_mut()?.step = step.into();
        Ok(())
    }

    /// Replace all tags
    pub fn set_tags(&mut self, tags: Vec<String>) -> Result<()> {
        self.meta_mut()?.tags = tags;
        Ok(())
    }

    /// Append a tag
    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<()> {
        self.meta_mut()?.tags.push(tag.into());
        Ok(())
    }

    /// Set the priority
    pub fn set_priority(&mut self, priority: f64) -> Result<()> {
        self.meta_mut()?.priority = priority;
        Ok(())
    }

    /// Set (or clear) the parent link hash.
    ///
    /// An empty hash is rejected; use `None` to clear.
    pub fn set_prev_link_hash(&mut self, hash: Option<LinkHash>) -> Result<()> {
        let meta = self.meta_mut()?;
        if let Some(hash) = &hash {
            check_parent_hash(hash)?;
        }
        meta.prev_link_hash = hash;
        Ok(())
    }

    /// Set (or clear) the out degree
    pub fn set_out_degree(&mut self, out_degree: Option<u32>) -> Result<()> {
        self.meta_mut()?.out_degree = out_degree;
        Ok(())
    }

    // =========================================================================
    // Opaque payloads
    // =========================================================================

    /// Decode the data payload. Returns None when no data is set.
    pub fn data<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.read_payload(PayloadField::Data)
    }

    /// Encode and store the data payload
    pub fn set_data<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.write_payload(PayloadField::Data, value)
    }

    /// Decode the metadata payload. Returns None when no metadata is set.
    pub fn metadata<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.read_payload(PayloadField::Metadata)
    }

    /// Encode and store the metadata payload
    pub fn set_metadata<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.write_payload(PayloadField::Metadata, value)
    }

    fn payload_codec(&self) -> Result<&'static dyn codec::PayloadCodec> {
        let meta = self.meta()?;
        let codec = codec::resolve(&meta.client_id)?;
        encoding::resolve(&self.version)?;
        Ok(codec)
    }

    fn read_payload<T: DeserializeOwned>(&self, field: PayloadField) -> Result<Option<T>> {
        let codec = self.payload_codec()?;
        let meta = self.meta()?;
        let bytes = match field {
            PayloadField::Data => &meta.data,
            PayloadField::Metadata => &meta.metadata,
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        let value = codec.decode(bytes)?;
        Ok(Some(serde_json::from_value(value)?))
    }

    fn write_payload<T: Serialize + ?Sized>(&mut self, field: PayloadField, value: &T) -> Result<()> {
        let codec = self.payload_codec()?;
        let bytes = codec.encode(&serde_json::to_value(value)?)?;
        let meta = self.meta_mut()?;
        match field {
            PayloadField::Data => meta.data = bytes,
            PayloadField::Metadata => meta.metadata = bytes,
        }
        Ok(())
    }

    // =========================================================================
    // Hashing and signing
    // =========================================================================

    /// Compute the content hash of this link.
    ///
    /// Signatures are not hashed. Meta may be absent: an absent meta is
    /// canonical content in its own right.
    pub fn hash(&self) -> Result<LinkHash> {
        let encoding = encoding::resolve(&self.version)?;
        let hash = encoding.digest(&encoding.canonical_bytes(self));
        debug!(version = %self.version, hash = %hash, "computed link hash");
        Ok(hash)
    }

    /// Bytes covered by a signature of the given version over a payload path.
    ///
    /// An empty payload path selects [`DEFAULT_PAYLOAD_PATH`].
    pub fn signed_bytes(&self, signature_version: &str, payload_path: &str) -> Result<Vec<u8>> {
        let encoding = encoding::resolve(&self.version)?;
        let scheme = signature::resolve_scheme(signature_version)?;
        let path = PayloadPath::parse(resolve_payload_path(payload_path))?;
        scheme.message(&encoding.document(self), &path)
    }

    /// Sign the given payload path and append the signature.
    ///
    /// The signature covers signatures already attached only if the path
    /// selects them.
    pub fn sign(&mut self, key: &KeyPair, payload_path: &str) -> Result<()> {
        let payload_path = resolve_payload_path(payload_path);
        let message = self.signed_bytes(SIGNATURE_VERSION, payload_path)?;
        let signature = Signature::new(
            SIGNATURE_VERSION,
            key.algorithm(),
            payload_path,
            key.public_key().to_pem()?,
            key.sign(&message),
        );
        self.signatures.push(signature);
        debug!(
            payload_path = %payload_path,
            count = self.signatures.len(),
            "signed link"
        );
        Ok(())
    }

    /// Check that this link is well formed and every signature verifies.
    ///
    /// Each signature is checked against the link as it was when that
    /// signature was appended (earlier signatures only).
    pub fn validate(&self) -> Result<()> {
        let process = self.process()?;
        if process.name.is_empty() {
            return Err(LinkError::MissingField("process.name".into()));
        }
        if self.map_id()?.is_empty() {
            return Err(LinkError::MissingField("mapId".into()));
        }
        encoding::resolve(&self.version)?;

        let mut layered = self.clone();
        layered.signatures.clear();
        for signature in &self.signatures {
            signature.validate(&layered)?;
            layered.signatures.push(signature.clone());
        }
        Ok(())
    }

    // =========================================================================
    // Snapshots and transport
    // =========================================================================

    /// Snapshot this link and its current hash.
    ///
    /// The segment holds a copy; later changes to this link do not reach it.
    pub fn segmentify(&self) -> Result<Segment> {
        let hash = self.hash()?;
        Ok(Segment::new(self.clone(), hash))
    }

    /// Consume this link into a segment
    pub fn into_segment(self) -> Result<Segment> {
        let hash = self.hash()?;
        Ok(Segment::new(self, hash))
    }

    /// Encode the whole link (signatures included) for transport
    pub fn serialize(&self) -> Vec<u8> {
        wire::encode_link(self)
    }
}

/// Decode a link produced by [`Link::serialize`]
pub fn deserialize(bytes: &[u8]) -> Result<Link> {
    wire::decode_link(bytes)
}

fn check_parent_hash(hash: &LinkHash) -> Result<()> {
    if hash.is_empty() {
        return Err(LinkError::InvalidLinkHash("parent hash is empty".into()));
    }
    Ok(())
}

fn resolve_payload_path(payload_path: &str) -> &str {
    if payload_path.is_empty() {
        DEFAULT_PAYLOAD_PATH
    } else {
        payload_path
    }
}

/// Builder for constructing links
///
/// The built link always uses the current link version and this
/// implementation's client id, so its own payload accessors work.
///
/// # Example
///
/// ```
/// # use provenance_link::{LinkBuilder, CLIENT_ID};
/// # use serde_json::{json, Value};
/// # fn main() -> provenance_link::Result<()> {
/// let link = LinkBuilder::new("p1", "m1")
///     .with_action("init")
///     .with_tags(vec!["tag1".into(), "tag2".into()])
///     .with_data(&json!({ "name": "batman", "age": 42 }))
///     .build()?;
///
/// assert_eq!(link.client_id()?, CLIENT_ID);
/// assert_eq!(link.data::<Value>()?, Some(json!({ "age": 42, "name": "batman" })));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LinkBuilder {
    process: Process,
    map_id: String,
    action: String,
    step: String,
    tags: Vec<String>,
    priority: f64,
    prev_link_hash: Option<LinkHash>,
    out_degree: Option<u32>,
    data: Option<Value>,
    metadata: Option<Value>,
    error: Option<LinkError>,
}

impl LinkBuilder {
    /// Create a new link builder for a process and map
    pub fn new(process: impl Into<String>, map_id: impl Into<String>) -> Self {
        Self {
            process: Process::new(process),
            map_id: map_id.into(),
            action: String::new(),
            step: String::new(),
            tags: Vec::new(),
            priority: 0.0,
            prev_link_hash: None,
            out_degree: None,
            data: None,
            metadata: None,
            error: None,
        }
    }

    /// Set the process state
    pub fn with_process_state(mut self, state: impl Into<String>) -> Self {
        self.process.state = state.into();
        self
    }

    /// Set the action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Set the process step
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = step.into();
        self
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Add a single tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the parent link. An empty hash fails the build.
    pub fn with_parent(mut self, prev_link_hash: LinkHash) -> Self {
        if let Err(err) = check_parent_hash(&prev_link_hash) {
            self.error.get_or_insert(err);
        }
        self.prev_link_hash = Some(prev_link_hash);
        self
    }

    /// Set the out degree
    pub fn with_out_degree(mut self, out_degree: u32) -> Self {
        self.out_degree = Some(out_degree);
        self
    }

    /// Set the data payload
    pub fn with_data<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        self.data = self.capture(data);
        self
    }

    /// Set the metadata payload
    pub fn with_metadata<T: Serialize + ?Sized>(mut self, metadata: &T) -> Self {
        self.metadata = self.capture(metadata);
        self
    }

    fn capture<T: Serialize + ?Sized>(&mut self, value: &T) -> Option<Value> {
        match serde_json::to_value(value) {
            Ok(value) => Some(value),
            Err(err) => {
                self.error.get_or_insert(err.into());
                None
            }
        }
    }

    /// Build the link
    ///
    /// Returns the first error recorded by a `with_*` method, if any.
    pub fn build(self) -> Result<Link> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut link = Link {
            version: LINK_VERSION.to_string(),
            meta: Some(LinkMeta {
                process: Some(self.process),
                map_id: self.map_id,
                action: self.action,
                step: self.step,
                tags: self.tags,
                priority: self.priority,
                prev_link_hash: self.prev_link_hash,
                client_id: CLIENT_ID.to_string(),
                out_degree: self.out_degree,
                data: Vec::new(),
                metadata: Vec::new(),
            }),
            signatures: Vec::new(),
        };

        if let Some(data) = self.data {
            link.set_data(&data)?;
        }
        if let Some(metadata) = self.metadata {
            link.set_metadata(&metadata)?;
        }

        Ok(link)
    }
}
