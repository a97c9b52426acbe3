//! # Ember Chain - A Single-Node Proof-of-Work Ledger
//!
//! An in-memory blockchain with an account-balance model: balances are
//! derived from transaction history rather than a stored index, pending
//! transfers wait in a pool keyed by transaction id, and peer-supplied
//! chains are adopted only when strictly longer and fully valid.
//!
//! ## How the code is organized
//! - `core/`: blocks, the proof-of-work search, difficulty retargeting,
//!   the chain with its validation and replacement rules, transactions,
//!   and the miner orchestrator
//! - `wallet/`: ECDSA P-256 identities and the history-scan balance
//!   calculator
//! - `storage/`: the in-memory transaction pool
//! - `config/`: protocol constants and runtime settings
//! - `utils/`: crypto primitives and the content-hash oracle
//! - `cli/`: command-line demos driving a node end to end
//!
//! The chain and pool are process-lifetime state. Transport and query
//! surfaces are collaborators: outbound propagation goes through the
//! `Broadcaster` trait, inbound peer chains go through
//! `Blockchain::replace_chain`, and inbound transactions go through
//! `TransactionPool::set`.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{
    Config, GLOBAL_CONFIG, INITIAL_DIFFICULTY, MINE_RATE, MINING_REWARD, REWARD_ADDRESS,
    STARTING_BALANCE,
};
pub use core::{
    Block, BlockData, Blockchain, Broadcaster, CancelToken, DifficultyAdjustment, Miner,
    NullBroadcaster, ProofOfWork, Transaction, TransactionInput, REWARD_INPUT,
};
pub use error::{BlockchainError, Result};
pub use storage::TransactionPool;
pub use utils::{crypto_hash, current_timestamp, sha256_digest};
pub use wallet::{calculate_balance, Wallet};
