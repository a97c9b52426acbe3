use crate::core::{Block, Transaction};
use std::collections::HashMap;
use std::sync::RwLock;

/// ( K -> transaction id, V -> Transaction )
///
/// Node-local holding area for transactions that are not yet settled in a
/// block. Entries are upserted by id, filtered for validity at mining
/// time, and reconciled away once a chain containing them is accepted.
pub struct TransactionPool {
    inner: RwLock<HashMap<String, Transaction>>,
}

impl Default for TransactionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert by id: a resubmitted (updated) transaction replaces its
    /// earlier version.
    pub fn set(&self, transaction: Transaction) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.insert(transaction.get_id().to_string(), transaction);
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on transaction pool");
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.get(id).cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                None
            }
        }
    }

    /// The pending transaction authored by `input_address`, if any. Each
    /// sender keeps at most one outgoing transaction in the pool; further
    /// transfers merge into it via `Transaction::update`.
    pub fn existing_transaction(&self, input_address: &str) -> Option<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool
                .values()
                .find(|transaction| transaction.get_input().get_address() == input_address)
                .cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                None
            }
        }
    }

    /// The pool entries that pass validation. Rejected entries log their
    /// reason but stay pooled.
    pub fn valid_transactions(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool
                .values()
                .filter(|transaction| transaction.validate())
                .cloned()
                .collect(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                Vec::new()
            }
        }
    }

    /// Drop every entry whose id appears in a block of `chain`. Called
    /// after a chain is mined locally or accepted from a peer, so the pool
    /// stops re-offering settled transactions.
    pub fn clear_mined(&self, chain: &[Block]) {
        match self.inner.write() {
            Ok(mut pool) => {
                for block in chain {
                    for transaction in block.get_data().transactions() {
                        pool.remove(transaction.get_id());
                    }
                }
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on transaction pool");
            }
        }
    }

    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.clear();
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on transaction pool");
            }
        }
    }

    pub fn all(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.values().cloned().collect(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.is_empty(),
            Err(_) => {
                log::error!("Failed to acquire read lock on transaction pool");
                true // Conservative default
            }
        }
    }
}
