use crate::core::block::{Block, BlockData};
use crate::core::DifficultyAdjustment;
use crate::error::{BlockchainError, Result};
use crate::utils::current_timestamp;
use data_encoding::HEXLOWER;
use log::info;
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop signal for an in-flight mining search.
///
/// The search checks the token once per nonce attempt; firing it aborts
/// with a `Mining` error. Nothing in the default mining paths cancels, so
/// an untouched token means the search runs to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

pub struct ProofOfWork<'a> {
    last_block: &'a Block,
    data: BlockData,
}

impl<'a> ProofOfWork<'a> {
    pub fn new(last_block: &'a Block, data: BlockData) -> ProofOfWork<'a> {
        ProofOfWork { last_block, data }
    }

    /// Search for the first nonce whose digest satisfies the difficulty.
    ///
    /// Every attempt re-reads the clock and re-derives the difficulty from
    /// the elapsed time, so a long search eases its own target as it runs.
    pub fn run(self, cancel: Option<&CancelToken>) -> Result<Block> {
        let last_hash = self.last_block.get_hash().to_string();
        let mut nonce: u64 = 0;

        loop {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(BlockchainError::Mining(
                        "Mining cancelled before a valid nonce was found".to_string(),
                    ));
                }
            }

            nonce += 1;
            let timestamp = current_timestamp()?;
            let difficulty = DifficultyAdjustment::adjust_difficulty(self.last_block, timestamp);
            let hash = Block::hash_fields(timestamp, &last_hash, &self.data, nonce, difficulty)?;

            if Self::meets_difficulty(&hash, difficulty) {
                info!("Mined block at difficulty {difficulty} after {nonce} attempts");
                return Ok(Block {
                    timestamp,
                    last_hash,
                    hash,
                    data: self.data,
                    nonce,
                    difficulty,
                });
            }
        }
    }

    /// A digest satisfies `difficulty` when its value is below
    /// `2^(256 - difficulty)`, which is the same as carrying at least
    /// `difficulty` leading zero bits.
    pub fn meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
        let bytes = match HEXLOWER.decode(hash_hex.as_bytes()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let hash_int = BigInt::from_bytes_be(Sign::Plus, &bytes);
        let mut target = BigInt::from(1);
        target.shl_assign(256u32.saturating_sub(difficulty));
        hash_int < target
    }
}
