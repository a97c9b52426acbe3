//! In-memory node state
//!
//! The pending-transaction pool. Nothing here persists: chain and pool
//! live for the lifetime of the process.

pub mod transaction_pool;

pub use transaction_pool::TransactionPool;
