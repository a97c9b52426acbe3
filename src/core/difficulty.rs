use crate::config::MINE_RATE;
use crate::core::Block;
use std::cmp;

const MIN_DIFFICULTY: u32 = 1;

/// Per-block difficulty retargeting.
pub struct DifficultyAdjustment;

impl DifficultyAdjustment {
    /// Exact ±1 retarget, not a windowed average: a block that took longer
    /// than `MINE_RATE` eases the next difficulty by one, anything faster
    /// hardens it by one. The result never drops below 1.
    pub fn adjust_difficulty(original_block: &Block, timestamp: i64) -> u32 {
        let difficulty = original_block.get_difficulty();

        if difficulty < MIN_DIFFICULTY {
            return MIN_DIFFICULTY;
        }

        if timestamp - original_block.get_timestamp() > MINE_RATE {
            cmp::max(difficulty - 1, MIN_DIFFICULTY)
        } else {
            difficulty + 1
        }
    }
}
