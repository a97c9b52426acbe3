use crate::config::MINING_REWARD;
use crate::core::{Block, BlockData, CancelToken};
use crate::error::Result;
use crate::wallet::calculate_balance;
use log::{error, info};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Clone-able handle to a node's chain.
///
/// The chain lives behind a single `Arc<RwLock<_>>`: local mining holds the
/// write lock for the whole mine-and-append, and `replace_chain` performs
/// its check-callback-swap inside one write-lock scope, so the two mutation
/// paths serialize against each other and no reader ever observes a
/// half-replaced chain.
#[derive(Clone)]
pub struct Blockchain {
    chain: Arc<RwLock<Vec<Block>>>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    pub fn new() -> Blockchain {
        Blockchain {
            chain: Arc::new(RwLock::new(vec![Block::genesis()])),
        }
    }

    /// Snapshot of the current chain.
    pub fn blocks(&self) -> Vec<Block> {
        self.chain
            .read()
            .expect("Failed to acquire read lock on chain - this should never happen")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.chain
            .read()
            .expect("Failed to acquire read lock on chain - this should never happen")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_block(&self) -> Block {
        self.chain
            .read()
            .expect("Failed to acquire read lock on chain - this should never happen")
            .last()
            .expect("Chain always contains the genesis block")
            .clone()
    }

    /// Mine a block over `data` and append it. Trusted path: the node does
    /// not re-validate its own blocks.
    pub fn add_block(&self, data: BlockData) -> Result<Block> {
        self.add_block_inner(data, None)
    }

    /// Same as `add_block`, but the search aborts once `cancel` fires.
    pub fn add_block_with_cancel(&self, data: BlockData, cancel: &CancelToken) -> Result<Block> {
        self.add_block_inner(data, Some(cancel))
    }

    fn add_block_inner(&self, data: BlockData, cancel: Option<&CancelToken>) -> Result<Block> {
        // The search runs under the write lock: a peer replacement cannot
        // land between reading the tip and appending the mined block.
        let mut chain = self
            .chain
            .write()
            .expect("Failed to acquire write lock on chain - this should never happen");
        let last_block = chain
            .last()
            .expect("Chain always contains the genesis block");

        let block = match cancel {
            Some(token) => Block::mine_block_with_cancel(last_block, data, token)?,
            None => Block::mine_block(last_block, data)?,
        };

        chain.push(block.clone());
        info!(
            "Added block {} at height {}",
            block.get_hash(),
            chain.len() - 1
        );
        Ok(block)
    }

    /// Structural validation of a candidate chain: genesis equality, hash
    /// linkage, hash recomputation, and a difficulty delta of at most one
    /// between adjacent blocks. Logs the first failing rule; any violation
    /// fails the whole chain.
    pub fn is_valid_chain(chain: &[Block]) -> bool {
        match chain.first() {
            Some(first) if *first == Block::genesis() => {}
            _ => {
                error!("Chain does not start with the genesis block");
                return false;
            }
        }

        for i in 1..chain.len() {
            let block = &chain[i];
            let previous = &chain[i - 1];

            if block.get_last_hash() != previous.get_hash() {
                error!("Block {i} does not link to the previous block's hash");
                return false;
            }

            let recomputed = match Block::hash_fields(
                block.get_timestamp(),
                block.get_last_hash(),
                block.get_data(),
                block.get_nonce(),
                block.get_difficulty(),
            ) {
                Ok(hash) => hash,
                Err(e) => {
                    error!("Failed to recompute the hash of block {i}: {e}");
                    return false;
                }
            };
            if block.get_hash() != recomputed {
                error!("Block {i} carries a hash that does not match its contents");
                return false;
            }

            let delta = previous.get_difficulty().abs_diff(block.get_difficulty());
            if delta > 1 {
                error!("Block {i} jumps difficulty by {delta}");
                return false;
            }
        }

        true
    }

    /// Adopt `candidate` if it is strictly longer, structurally valid, and
    /// (when `validate_transactions` is set) carries valid transaction
    /// data. The checks run in that order and short-circuit; a rejection
    /// logs its reason and leaves the chain untouched. On success
    /// `on_success` runs with the candidate before the swap becomes
    /// visible.
    ///
    /// The callback executes inside the exclusive chain section, so it must
    /// not call back into this `Blockchain`; its intended job is pool
    /// reconciliation.
    pub fn replace_chain(
        &self,
        candidate: Vec<Block>,
        validate_transactions: bool,
        on_success: Option<&dyn Fn(&[Block])>,
    ) {
        let mut chain = self
            .chain
            .write()
            .expect("Failed to acquire write lock on chain - this should never happen");

        if candidate.len() <= chain.len() {
            error!("Rejected incoming chain: it must be longer than the current chain");
            return;
        }

        if !Self::is_valid_chain(&candidate) {
            error!("Rejected incoming chain: it must be valid");
            return;
        }

        if validate_transactions && !Self::validate_transaction_data_against(&chain, &candidate) {
            error!("Rejected incoming chain: it must carry valid transaction data");
            return;
        }

        if let Some(callback) = on_success {
            callback(&candidate);
        }

        info!(
            "Replacing the local chain of {} blocks with an incoming chain of {} blocks",
            chain.len(),
            candidate.len()
        );
        *chain = candidate;
    }

    /// Validation predicate for the transactions embedded in a candidate
    /// chain, judged against this node's own current chain.
    pub fn validate_transaction_data(&self, candidate: &[Block]) -> bool {
        let chain = self
            .chain
            .read()
            .expect("Failed to acquire read lock on chain - this should never happen");
        Self::validate_transaction_data_against(&chain, candidate)
    }

    fn validate_transaction_data_against(current: &[Block], candidate: &[Block]) -> bool {
        for block in candidate.iter().skip(1) {
            let transactions = match block.get_data() {
                BlockData::Transactions(transactions) => transactions,
                // Opaque payloads settle no transactions.
                BlockData::Raw(_) => continue,
            };

            let mut reward_transaction_count = 0u32;
            let mut seen_ids: HashSet<&str> = HashSet::new();

            for transaction in transactions {
                if transaction.is_reward() {
                    reward_transaction_count += 1;
                    if reward_transaction_count > 1 {
                        error!("Miner rewards exceed the one-per-block limit");
                        return false;
                    }

                    let output_map = transaction.get_output_map();
                    if output_map.len() != 1 || output_map.values().next() != Some(&MINING_REWARD) {
                        error!("Malformed output map on a reward transaction");
                        return false;
                    }
                } else {
                    if !transaction.validate() {
                        error!("Malformed transaction {}", transaction.get_id());
                        return false;
                    }

                    // The sender's claimed balance is checked against the
                    // chain this node already trusts, not the candidate.
                    let address = transaction.get_input().get_address();
                    let true_balance = calculate_balance(current, address);
                    if transaction.get_input().get_amount() != true_balance {
                        error!(
                            "Transaction from {address} claims a balance of {} but the chain records {true_balance}",
                            transaction.get_input().get_amount()
                        );
                        return false;
                    }

                    if !seen_ids.insert(transaction.get_id()) {
                        error!(
                            "Transaction {} appears more than once in a block",
                            transaction.get_id()
                        );
                        return false;
                    }
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STARTING_BALANCE;
    use crate::core::Transaction;
    use crate::wallet::Wallet;
    use std::cell::Cell;

    fn raw(data: &str) -> BlockData {
        BlockData::Raw(data.to_string())
    }

    /// A peer chain of `blocks` mined blocks, each settling one wallet
    /// transfer plus a reward.
    fn peer_chain_with_transactions(blocks: usize) -> Vec<Block> {
        let peer = Blockchain::new();
        let miner = Wallet::new().unwrap();

        for _ in 0..blocks {
            let wallet = Wallet::new().unwrap();
            let transaction = wallet
                .create_transaction("recipient", 40, Some(&peer.blocks()))
                .unwrap();
            let reward = Transaction::reward_transaction(&miner);
            peer.add_block(BlockData::Transactions(vec![transaction, reward]))
                .unwrap();
        }

        peer.blocks()
    }

    #[test]
    fn test_starts_with_the_genesis_block() {
        let blockchain = Blockchain::new();

        assert_eq!(blockchain.blocks()[0], Block::genesis());
        assert_eq!(blockchain.len(), 1);
    }

    #[test]
    fn test_add_block_appends_the_data() {
        let blockchain = Blockchain::new();

        blockchain.add_block(raw("foo")).unwrap();

        assert_eq!(blockchain.last_block().get_data(), &raw("foo"));
        assert_eq!(blockchain.len(), 2);
    }

    #[test]
    fn test_chain_without_genesis_start_is_invalid() {
        let blockchain = Blockchain::new();
        blockchain.add_block(raw("foo")).unwrap();

        let mut chain = blockchain.blocks();
        chain[0].data = raw("fake-genesis");

        assert!(!Blockchain::is_valid_chain(&chain));
    }

    #[test]
    fn test_honest_multi_block_chain_is_valid() {
        let chain = peer_chain_with_transactions(3);

        assert!(Blockchain::is_valid_chain(&chain));
    }

    #[test]
    fn test_tampered_last_hash_invalidates_the_chain() {
        let blockchain = Blockchain::new();
        blockchain.add_block(raw("one")).unwrap();
        blockchain.add_block(raw("two")).unwrap();

        let mut chain = blockchain.blocks();
        chain[2].last_hash = "broken-last-hash".to_string();

        assert!(!Blockchain::is_valid_chain(&chain));
    }

    #[test]
    fn test_tampered_data_invalidates_the_chain() {
        let blockchain = Blockchain::new();
        blockchain.add_block(raw("one")).unwrap();

        let mut chain = blockchain.blocks();
        chain[1].data = raw("tampered");

        assert!(!Blockchain::is_valid_chain(&chain));
    }

    #[test]
    fn test_tampered_hash_invalidates_the_chain() {
        let blockchain = Blockchain::new();
        blockchain.add_block(raw("one")).unwrap();

        let mut chain = blockchain.blocks();
        chain[1].hash = "0".repeat(64);

        assert!(!Blockchain::is_valid_chain(&chain));
    }

    #[test]
    fn test_jumped_difficulty_invalidates_the_chain() {
        let blockchain = Blockchain::new();
        blockchain.add_block(raw("one")).unwrap();

        let mut chain = blockchain.blocks();
        let last = chain.last().unwrap().clone();
        let difficulty = last.get_difficulty() + 3;
        let timestamp = last.get_timestamp() + 1;
        let hash = Block::hash_fields(timestamp, last.get_hash(), &raw("jump"), 0, difficulty)
            .unwrap();
        chain.push(Block {
            timestamp,
            last_hash: last.get_hash().to_string(),
            hash,
            data: raw("jump"),
            nonce: 0,
            difficulty,
        });

        assert!(!Blockchain::is_valid_chain(&chain));
    }

    #[test]
    fn test_replace_chain_rejects_shorter_or_equal_candidate() {
        let blockchain = Blockchain::new();
        blockchain.add_block(raw("local")).unwrap();
        let original = blockchain.blocks();

        blockchain.replace_chain(vec![Block::genesis()], false, None);
        assert_eq!(blockchain.blocks(), original);

        blockchain.replace_chain(original.clone(), false, None);
        assert_eq!(blockchain.blocks(), original);
    }

    #[test]
    fn test_replace_chain_rejects_longer_invalid_candidate() {
        let blockchain = Blockchain::new();
        let original = blockchain.blocks();

        let peer = Blockchain::new();
        peer.add_block(raw("one")).unwrap();
        peer.add_block(raw("two")).unwrap();
        let mut candidate = peer.blocks();
        candidate[1].hash = "tampered".to_string();

        blockchain.replace_chain(candidate, false, None);

        assert_eq!(blockchain.blocks(), original);
    }

    #[test]
    fn test_replace_chain_adopts_longer_valid_candidate() {
        let blockchain = Blockchain::new();

        let peer = Blockchain::new();
        peer.add_block(raw("one")).unwrap();
        peer.add_block(raw("two")).unwrap();
        let candidate = peer.blocks();

        blockchain.replace_chain(candidate.clone(), false, None);

        assert_eq!(blockchain.blocks(), candidate);
    }

    #[test]
    fn test_replace_chain_fires_on_success_exactly_once() {
        let blockchain = Blockchain::new();
        let peer = Blockchain::new();
        peer.add_block(raw("one")).unwrap();
        let candidate = peer.blocks();

        let calls = Cell::new(0u32);
        let observed_len = Cell::new(0usize);
        blockchain.replace_chain(
            candidate,
            false,
            Some(&|incoming: &[Block]| {
                calls.set(calls.get() + 1);
                observed_len.set(incoming.len());
            }),
        );

        assert_eq!(calls.get(), 1);
        assert_eq!(observed_len.get(), 2);
    }

    #[test]
    fn test_replace_chain_skips_on_success_when_rejecting() {
        let blockchain = Blockchain::new();
        blockchain.add_block(raw("local")).unwrap();

        let calls = Cell::new(0u32);
        blockchain.replace_chain(
            vec![Block::genesis()],
            false,
            Some(&|_: &[Block]| calls.set(calls.get() + 1)),
        );

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_replace_chain_rejects_invalid_transaction_data() {
        let blockchain = Blockchain::new();
        let original = blockchain.blocks();

        let peer = Blockchain::new();
        let miner = Wallet::new().unwrap();
        peer.add_block(BlockData::Transactions(vec![
            Transaction::reward_transaction(&miner),
            Transaction::reward_transaction(&miner),
        ]))
        .unwrap();

        blockchain.replace_chain(peer.blocks(), true, None);

        assert_eq!(blockchain.blocks(), original);
    }

    #[test]
    fn test_transaction_data_with_one_reward_per_block_is_valid() {
        let blockchain = Blockchain::new();
        let candidate = peer_chain_with_transactions(2);

        assert!(blockchain.validate_transaction_data(&candidate));
    }

    #[test]
    fn test_transaction_data_with_multiple_rewards_is_invalid() {
        let blockchain = Blockchain::new();
        let miner = Wallet::new().unwrap();

        let peer = Blockchain::new();
        peer.add_block(BlockData::Transactions(vec![
            Transaction::reward_transaction(&miner),
            Transaction::reward_transaction(&miner),
        ]))
        .unwrap();

        assert!(!blockchain.validate_transaction_data(&peer.blocks()));
    }

    #[test]
    fn test_transaction_data_with_malformed_reward_output_is_invalid() {
        let blockchain = Blockchain::new();
        let miner = Wallet::new().unwrap();

        let mut reward = Transaction::reward_transaction(&miner);
        reward.output_map.insert(miner.address(), MINING_REWARD + 1);

        let peer = Blockchain::new();
        peer.add_block(BlockData::Transactions(vec![reward])).unwrap();

        assert!(!blockchain.validate_transaction_data(&peer.blocks()));
    }

    #[test]
    fn test_transaction_data_with_tampered_output_map_is_invalid() {
        let blockchain = Blockchain::new();
        let wallet = Wallet::new().unwrap();

        let mut transaction = wallet
            .create_transaction("recipient", 40, None)
            .unwrap();
        transaction
            .output_map
            .insert(wallet.address(), 999_999);

        let peer = Blockchain::new();
        peer.add_block(BlockData::Transactions(vec![transaction]))
            .unwrap();

        assert!(!blockchain.validate_transaction_data(&peer.blocks()));
    }

    #[test]
    fn test_transaction_data_with_stale_claimed_balance_is_invalid() {
        // Settle one transfer so the wallet's true balance drops below the
        // starting balance, then have it claim the stale figure.
        let blockchain = Blockchain::new();
        let wallet = Wallet::new().unwrap();
        let spent = wallet
            .create_transaction("recipient", 50, Some(&blockchain.blocks()))
            .unwrap();
        blockchain
            .add_block(BlockData::Transactions(vec![spent]))
            .unwrap();
        assert_eq!(
            calculate_balance(&blockchain.blocks(), &wallet.address()),
            STARTING_BALANCE - 50
        );

        let stale = wallet.create_transaction("recipient", 10, None).unwrap();
        let peer = Blockchain::new();
        peer.add_block(raw("filler")).unwrap();
        peer.add_block(BlockData::Transactions(vec![stale])).unwrap();

        assert!(!blockchain.validate_transaction_data(&peer.blocks()));
    }

    #[test]
    fn test_transaction_data_with_duplicate_transaction_is_invalid() {
        let blockchain = Blockchain::new();
        let wallet = Wallet::new().unwrap();

        let transaction = wallet.create_transaction("recipient", 40, None).unwrap();

        let peer = Blockchain::new();
        peer.add_block(BlockData::Transactions(vec![
            transaction.clone(),
            transaction,
        ]))
        .unwrap();

        assert!(!blockchain.validate_transaction_data(&peer.blocks()));
    }
}
