//! Error handling for the ledger engine
//!
//! This module provides the error types shared by all chain operations.
//! Validation predicates never produce these; they return `bool` and log
//! the failing rule. Errors are reserved for construction and mutation
//! paths.

use std::fmt;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for chain operations
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Cryptographic operation errors
    Crypto(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Insufficient balance for a transfer
    InsufficientFunds { required: u64, available: u64 },
    /// Mining errors
    Mining(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}
