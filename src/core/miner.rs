use crate::core::{Block, BlockData, Blockchain, Transaction};
use crate::error::Result;
use crate::storage::TransactionPool;
use crate::wallet::Wallet;
use log::info;
use std::sync::Arc;

/// Outbound propagation seam. The transport behind it (pub/sub fan-out,
/// HTTP push, in-process wiring) is a collaborator, not part of the
/// engine; peers feed received chains back through
/// `Blockchain::replace_chain` and received transactions through
/// `TransactionPool::set`.
pub trait Broadcaster {
    fn broadcast_chain(&self, chain: &[Block]);
    fn broadcast_transaction(&self, transaction: &Transaction);
}

/// Broadcaster that drops every message; for single-process use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn broadcast_chain(&self, _chain: &[Block]) {}
    fn broadcast_transaction(&self, _transaction: &Transaction) {}
}

/// Glue between the pool and the chain: selects the valid pending
/// transactions, rewards itself, and settles them into a mined block.
pub struct Miner {
    blockchain: Blockchain,
    pool: Arc<TransactionPool>,
    wallet: Arc<Wallet>,
    broadcaster: Arc<dyn Broadcaster + Send + Sync>,
}

impl Miner {
    pub fn new(
        blockchain: Blockchain,
        pool: Arc<TransactionPool>,
        wallet: Arc<Wallet>,
        broadcaster: Arc<dyn Broadcaster + Send + Sync>,
    ) -> Miner {
        Miner {
            blockchain,
            pool,
            wallet,
            broadcaster,
        }
    }

    /// One full mining cycle: gather the valid pool entries, append one
    /// reward transaction, extend the chain, announce the result, and
    /// clear the pool. Blocks until the proof-of-work search terminates;
    /// there is no retry.
    pub fn mine_transactions(&self) -> Result<Block> {
        let mut transactions = self.pool.valid_transactions();
        transactions.push(Transaction::reward_transaction(&self.wallet));

        info!("Mining a block settling {} transactions", transactions.len());
        let block = self
            .blockchain
            .add_block(BlockData::Transactions(transactions))?;

        self.broadcaster.broadcast_chain(&self.blockchain.blocks());
        self.pool.clear();

        Ok(block)
    }

    pub fn blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }
}
