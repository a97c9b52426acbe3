//! Configuration for the ledger engine
//!
//! Protocol constants every node must agree on, plus the env-backed
//! runtime settings map.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};

/// Target time between mined blocks, in milliseconds. The difficulty
/// retarget compares each block's mine time against this rate.
pub const MINE_RATE: i64 = 200;

/// Difficulty the genesis block starts the chain at.
pub const INITIAL_DIFFICULTY: u32 = 3;

// Fixed genesis fields. Every valid chain must start with exactly this
// block, so these are protocol constants, not node configuration.
pub const GENESIS_TIMESTAMP: i64 = 2000;
pub const GENESIS_LAST_HASH: &str = "----";
pub const GENESIS_HASH: &str = "genesis-hash";

/// Balance credited to an address that has no transaction history.
pub const STARTING_BALANCE: u64 = 1000;

/// Amount a reward transaction credits to the miner of a block.
pub const MINING_REWARD: u64 = 50;

/// Sentinel input address that marks reward transactions. No key pair
/// hashes to this value, so it cannot collide with a real wallet.
pub const REWARD_ADDRESS: &str = "*miner-reward*";
