//! Common types carried by a link's meta

use crate::error::{LinkError, Result};
use std::fmt;
use std::str::FromStr;

/// Process a link belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Process {
    /// Process name
    pub name: String,

    /// Current state of the process (free-form)
    pub state: String,
}

impl Process {
    /// Create a new process with an empty state
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: String::new(),
        }
    }

    /// Set the process state
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }
}

/// Metadata container of a link
///
/// `data` and `metadata` are opaque bytes. They are only interpreted
/// through the payload codec registered for `client_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkMeta {
    /// Process this link belongs to
    pub process: Option<Process>,

    /// Identifier of the map (logical sequence) this link belongs to
    pub map_id: String,

    /// What this link represents
    pub action: String,

    /// Step of the process
    pub step: String,

    /// Ordered tags, duplicates allowed
    pub tags: Vec<String>,

    /// Ordering hint among links of the same map
    pub priority: f64,

    /// Hash of the parent link (None for a root link).
    ///
    /// Encodings write an absent hash as empty bytes, so `Some` must hold a
    /// non-empty hash; the link setters and builder enforce this.
    pub prev_link_hash: Option<LinkHash>,

    /// Implementation that produced this link
    pub client_id: String,

    /// How many children this link may have
    pub out_degree: Option<u32>,

    /// Encoded data payload
    pub data: Vec<u8>,

    /// Encoded metadata payload
    pub metadata: Vec<u8>,
}

/// Content hash of a link
///
/// The length depends on the link encoding version (32 bytes for 1.0.0).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHash(Vec<u8>);

impl LinkHash {
    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Digest length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for an empty (unset) hash
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for LinkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for LinkHash {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(LinkError::InvalidLinkHash("empty string".into()));
        }
        Ok(Self(hex::decode(s)?))
    }
}

impl AsRef<[u8]> for LinkHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for LinkHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes.to_vec())
    }
}
