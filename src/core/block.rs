use crate::config::{GENESIS_HASH, GENESIS_LAST_HASH, GENESIS_TIMESTAMP, INITIAL_DIFFICULTY};
use crate::core::{CancelToken, ProofOfWork, Transaction};
use crate::error::Result;
use crate::utils::crypto_hash;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Payload carried by a block.
///
/// Mined blocks settle an ordered list of transactions (genesis carries an
/// empty one); manually appended blocks may carry an opaque payload
/// instead. Validation dispatches on this tag rather than inspecting the
/// payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockData {
    Transactions(Vec<Transaction>),
    Raw(String),
}

impl BlockData {
    /// The transactions settled by this payload; empty for raw payloads.
    pub fn transactions(&self) -> &[Transaction] {
        match self {
            BlockData::Transactions(transactions) => transactions,
            BlockData::Raw(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) timestamp: i64,
    pub(crate) last_hash: String,
    pub(crate) hash: String,
    pub(crate) data: BlockData,
    pub(crate) nonce: u64,
    pub(crate) difficulty: u32,
}

impl Block {
    /// The fixed first block. Never mined; every valid chain starts with
    /// exactly this value.
    pub fn genesis() -> Block {
        Block {
            timestamp: GENESIS_TIMESTAMP,
            last_hash: GENESIS_LAST_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            data: BlockData::Transactions(vec![]),
            nonce: 0,
            difficulty: INITIAL_DIFFICULTY,
        }
    }

    /// Mine the block that extends `last_block` with `data`. CPU-bound
    /// search with no upper bound on iterations; blocks the caller until a
    /// satisfying nonce is found.
    pub fn mine_block(last_block: &Block, data: BlockData) -> Result<Block> {
        ProofOfWork::new(last_block, data).run(None)
    }

    /// Same search, but aborts with a `Mining` error once `cancel` fires.
    /// The token is checked once per nonce attempt.
    pub fn mine_block_with_cancel(
        last_block: &Block,
        data: BlockData,
        cancel: &CancelToken,
    ) -> Result<Block> {
        ProofOfWork::new(last_block, data).run(Some(cancel))
    }

    /// Content digest over every hashed block field. The stored `hash` of
    /// any non-genesis block must equal this recomputation.
    pub fn hash_fields(
        timestamp: i64,
        last_hash: &str,
        data: &BlockData,
        nonce: u64,
        difficulty: u32,
    ) -> Result<String> {
        Ok(crypto_hash(&[
            json!(timestamp),
            json!(last_hash),
            serde_json::to_value(data)?,
            json!(nonce),
            json!(difficulty),
        ]))
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_last_hash(&self) -> &str {
        self.last_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_data(&self) -> &BlockData {
        &self.data
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }
}
