//! Segments: immutable (link, hash) snapshots
//!
//! A segment is created from a link with [`Link::segmentify`] or
//! [`Link::into_segment`]; the hash is always recomputed from the wrapped
//! link at that point. There are no mutators.

use crate::error::{LinkError, Result};
use crate::link::Link;
use crate::types::LinkHash;
use crate::wire;

/// A link together with the hash computed when the segment was created
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    link: Link,
    link_hash: LinkHash,
}

impl Segment {
    pub(crate) fn new(link: Link, link_hash: LinkHash) -> Self {
        Self { link, link_hash }
    }

    /// The wrapped link
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Hash of the wrapped link at creation time
    pub fn link_hash(&self) -> &LinkHash {
        &self.link_hash
    }

    /// Unwrap into the link (e.g. to derive a child or add signatures)
    pub fn into_link(self) -> Link {
        self.link
    }

    /// Recompute the link hash, compare it to the stored one, then validate
    /// the link and its signatures.
    pub fn validate(&self) -> Result<()> {
        check_hash(&self.link, &self.link_hash)?;
        self.link.validate()
    }

    /// Encode the segment for transport
    pub fn serialize(&self) -> Vec<u8> {
        wire::encode_segment(&self.link, &self.link_hash)
    }
}

/// Decode a segment produced by [`Segment::serialize`].
///
/// The transported hash must match the hash recomputed from the link.
pub fn deserialize_segment(bytes: &[u8]) -> Result<Segment> {
    let (link, claimed) = wire::decode_segment(bytes)?;
    check_hash(&link, &claimed)?;
    Ok(Segment::new(link, claimed))
}

fn check_hash(link: &Link, expected: &LinkHash) -> Result<()> {
    let actual = link.hash()?;
    if &actual != expected {
        return Err(LinkError::HashMismatch {
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::link::LinkBuilder;

    #[test]
    fn test_segment_hash_matches_link_hash() {
        let link = LinkBuilder::new("p1", "m1").with_action("init").build().unwrap();
        let segment = link.segmentify().unwrap();

        assert_eq!(segment.link_hash(), &link.hash().unwrap());
        assert_eq!(segment.link(), &link);
    }

    #[test]
    fn test_into_segment() {
        let link = LinkBuilder::new("p1", "m1").build().unwrap();
        let hash = link.hash().unwrap();

        let segment = link.into_segment().unwrap();
        assert_eq!(segment.link_hash(), &hash);
        assert_eq!(segment.into_link().hash().unwrap(), hash);
    }

    #[test]
    fn test_segment_roundtrip_validates() {
        let kp = KeyPair::generate();
        let mut link = LinkBuilder::new("p1", "m1").build().unwrap();
        link.sign(&kp, "").unwrap();

        let segment = link.segmentify().unwrap();
        let restored = deserialize_segment(&segment.serialize()).unwrap();

        assert_eq!(restored, segment);
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn test_forged_hash_rejected() {
        let link = LinkBuilder::new("p1", "m1").build().unwrap();
        let forged = Segment::new(link, LinkHash::from([0u8; 32]));

        assert!(matches!(forged.validate(), Err(LinkError::HashMismatch { .. })));
        assert!(matches!(
            deserialize_segment(&forged.serialize()),
            Err(LinkError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_deserialize_segment_unknown_version() {
        let mut link = LinkBuilder::new("p1", "m1").build().unwrap();
        let segment = link.segmentify().unwrap();
        link.version = "0.0.1".into();
        let bytes = wire::encode_segment(&link, segment.link_hash());

        assert_eq!(
            deserialize_segment(&bytes).err(),
            Some(LinkError::UnknownLinkVersion("0.0.1".into()))
        );
    }
}
