use data_encoding::HEXLOWER;
use serde_json::Value;

use crate::utils::sha256_digest;

/// Content digest over an arbitrary sequence of JSON-representable values.
///
/// Each input is rendered to its canonical JSON string, the strings are
/// sorted, joined, and the result is SHA-256 hashed. Sorting makes the
/// digest independent of argument order: `crypto_hash` over a permutation
/// of the same inputs yields the same hex string, while any change to a
/// nested value yields a different one.
///
/// Maps must serialize with a stable key order for this to be
/// deterministic; the transaction model uses `BTreeMap` for exactly that
/// reason.
pub fn crypto_hash(inputs: &[Value]) -> String {
    let mut parts: Vec<String> = inputs.iter().map(|value| value.to_string()).collect();
    parts.sort();
    let joined = parts.join(" ");
    HEXLOWER.encode(&sha256_digest(joined.as_bytes()))
}
