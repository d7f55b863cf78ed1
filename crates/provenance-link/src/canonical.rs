//! Canonical JSON
//!
//! Compact output with object keys sorted in byte order, whatever order the
//! `serde_json` map iterates in. Scalars are written exactly as `serde_json`
//! writes them. Payload bytes and v1 signed bytes are both produced here.

use crate::error::{LinkError, Result};
use serde_json::{Map, Value};

/// Maximum nesting depth accepted for canonicalization
pub const MAX_DEPTH: usize = 128;

/// Encode a value as canonical JSON bytes.
///
/// Values nested deeper than [`MAX_DEPTH`] are rejected.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    emit_value(value, &mut output, 0)?;
    Ok(output)
}

fn emit_value(value: &Value, output: &mut Vec<u8>, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(LinkError::Serialization(format!(
            "JSON nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    match value {
        Value::Array(items) => emit_array(items, output, depth),
        Value::Object(object) => emit_object(object, output, depth),
        scalar => Ok(serde_json::to_writer(output, scalar)?),
    }
}

fn emit_array(items: &[Value], output: &mut Vec<u8>, depth: usize) -> Result<()> {
    output.push(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            output.push(b',');
        }
        emit_value(item, output, depth + 1)?;
    }
    output.push(b']');
    Ok(())
}

fn emit_object(object: &Map<String, Value>, output: &mut Vec<u8>, depth: usize) -> Result<()> {
    let mut entries: Vec<(&String, &Value)> = object.iter().collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    output.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            output.push(b',');
        }
        serde_json::to_writer(&mut *output, key)?;
        output.push(b':');
        emit_value(value, output, depth + 1)?;
    }
    output.push(b'}');
    Ok(())
}
