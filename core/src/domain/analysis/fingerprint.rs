use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Hex SHA-256 of raw content, used for uploaded images.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex SHA-256 of the canonical JSON form of `fields`.
///
/// Object keys are emitted in sorted order at every depth, regardless of
/// struct declaration or map insertion order. Callers pass only the fields
/// that affect the analysis outcome; anything volatile must be left out.
pub fn fingerprint<T: Serialize + ?Sized>(fields: &T) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_vec(&canonicalize(serde_json::to_value(fields)?))?;

    Ok(fingerprint_bytes(&canonical))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// True for a 64 character lowercase hex digest.
pub fn is_fingerprint(candidate: &str) -> bool {
    candidate.len() == 64
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
