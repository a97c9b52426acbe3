//! Utility functions and helpers
//!
//! Cryptographic primitives and the content-hash oracle used for block
//! identity and transaction signing.

pub mod crypto;
pub mod crypto_hash;

pub use crypto::{
    current_timestamp, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    sha256_digest,
};

pub use crypto_hash::crypto_hash;
