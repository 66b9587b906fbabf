//! Canonical JSON and the identities derived from it.
//!
//! Object keys are sorted at every depth, so equal values encode to equal
//! bytes regardless of field or map insertion order. Experiment hashes and
//! run seeds are both computed over this encoding.

use gsweep_core::errors::{ErrorInfo, SweepError};
use gsweep_core::rng::seed_from_bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Encodes `value` as compact JSON with sorted keys.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SweepError> {
    let value = serde_json::to_value(value)
        .map_err(|err| SweepError::Serde(ErrorInfo::new("json-serialize", err.to_string())))?;
    serde_json::to_vec(&sort_keys(value))
        .map_err(|err| SweepError::Serde(ErrorInfo::new("json-write", err.to_string())))
}

/// SHA-256 of the canonical encoding, as lowercase hex.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, SweepError> {
    Ok(format!("{:x}", Sha256::digest(to_canonical_json_bytes(value)?)))
}

/// 64-bit seed of the canonical encoding.
///
/// Equal payloads give equal seeds in every process and on every platform.
pub fn stable_seed<T: Serialize>(value: &T) -> Result<u64, SweepError> {
    Ok(seed_from_bytes(&to_canonical_json_bytes(value)?))
}
