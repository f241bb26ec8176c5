//! Canonical JSON serialization used as HMAC signing input.
//!
//! Matches `canonicalize_auth_payload`: keys sorted recursively, no
//! inter-token whitespace. `serde_json::Value::Object` is backed by a
//! `BTreeMap` when the `preserve_order` feature is off (the default used by
//! this workspace), so re-parsing into a fresh `Value` already sorts keys;
//! [`canonicalize`] makes that guarantee explicit rather than relying on an
//! implementation detail of the feature flag.

use serde_json::Value;

/// Render `value` as compact JSON with object keys in sorted order.
///
/// Idempotent: canonicalizing an already-canonical string reproduces it
/// byte-for-byte, and the result is independent of the key order in the
/// input.
#[must_use]
pub fn canonicalize(value: &Value) -> String {
    let sorted = sort_keys(value);
    serde_json::to_string(&sorted).expect("canonicalized value is always serializable")
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = std::collections::BTreeMap::new();
            for (k, v) in map {
                let _ = sorted.insert(k.clone(), sort_keys(v));
            }
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                let _ = out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
