//! Opaque payload codecs
//!
//! A link's `data` and `metadata` fields are raw bytes whose encoding is a
//! convention of the implementation that produced the link. Each convention
//! is a [`PayloadCodec`] registered under the producer's client id; a client
//! id without a registered codec cannot be decoded here.

use crate::canonical;
use crate::error::{LinkError, Result};
use crate::CLIENT_ID;
use serde_json::Value;

/// Encoder/decoder for opaque link payloads
pub trait PayloadCodec: Send + Sync {
    /// Client id whose payload convention this codec implements
    fn client_id(&self) -> &'static str;

    /// Encode a structured value to payload bytes
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decode payload bytes to a structured value
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// Canonical JSON payloads: sorted object keys, no insignificant whitespace.
///
/// Objects and bare scalars are both accepted. Integers, floats, strings
/// and booleans keep their JSON kinds across a round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn client_id(&self) -> &'static str {
        CLIENT_ID
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        canonical::to_vec(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes).map_err(LinkError::from)
    }
}

static CODECS: &[&dyn PayloadCodec] = &[&JsonCodec];

/// Look up the codec for a client id.
///
/// An empty client id is treated as unset and resolves to this
/// implementation's own codec.
pub fn resolve(client_id: &str) -> Result<&'static dyn PayloadCodec> {
    let client_id = if client_id.is_empty() { CLIENT_ID } else { client_id };
    CODECS
        .iter()
        .copied()
        .find(|codec| codec.client_id() == client_id)
        .ok_or_else(|| LinkError::UnknownClientId(client_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_own_client_id() {
        let codec = resolve(CLIENT_ID).unwrap();
        assert_eq!(codec.client_id(), CLIENT_ID);
    }

    #[test]
    fn test_resolve_empty_client_id_uses_own_codec() {
        let codec = resolve("").unwrap();
        assert_eq!(codec.client_id(), CLIENT_ID);
    }

    #[test]
    fn test_resolve_foreign_client_id_fails() {
        let result = resolve("github.com/someone/else");
        assert_eq!(
            result.err(),
            Some(LinkError::UnknownClientId("github.com/someone/else".into()))
        );
    }

    #[test]
    fn test_json_codec_sorts_keys() {
        let bytes = JsonCodec.encode(&json!({ "z": 1, "a": [true, null] })).unwrap();
        assert_eq!(bytes, br#"{"a":[true,null],"z":1}"#.to_vec());
    }

    #[test]
    fn test_json_codec_ignores_insertion_order() {
        let mut object = serde_json::Map::new();
        object.insert("name".into(), json!("batman"));
        object.insert("age".into(), json!(42));

        let bytes = JsonCodec.encode(&Value::Object(object)).unwrap();
        assert_eq!(bytes, br#"{"age":42,"name":"batman"}"#.to_vec());
    }

    #[test]
    fn test_json_codec_rejects_deep_nesting() {
        let mut value = json!(null);
        for _ in 0..200 {
            value = json!([value]);
        }
        assert!(matches!(JsonCodec.encode(&value), Err(LinkError::Serialization(_))));
    }

    #[test]
    fn test_json_codec_scalars() {
        for value in [json!(42), json!(-7.5), json!("batman"), json!(false)] {
            let bytes = JsonCodec.encode(&value).unwrap();
            assert_eq!(JsonCodec.decode(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_json_codec_keeps_integer_kind() {
        let bytes = JsonCodec.encode(&json!({ "age": 42 })).unwrap();
        let decoded = JsonCodec.decode(&bytes).unwrap();
        assert!(decoded["age"].is_u64());
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        assert!(matches!(
            JsonCodec.decode(b"\xff\x00"),
            Err(LinkError::Serialization(_))
        ));
    }
}
