//! Core ledger components
//!
//! Blocks and the proof-of-work search, the chain container with its
//! validation and replacement rules, signed transactions, and the miner
//! orchestrator.

pub mod block;
pub mod blockchain;
pub mod difficulty;
pub mod miner;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, BlockData};
pub use blockchain::Blockchain;
pub use difficulty::DifficultyAdjustment;
pub use miner::{Broadcaster, Miner, NullBroadcaster};
pub use proof_of_work::{CancelToken, ProofOfWork};
pub use transaction::{Transaction, TransactionInput, REWARD_INPUT};
