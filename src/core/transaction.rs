use crate::config::{MINING_REWARD, REWARD_ADDRESS};
use crate::error::{BlockchainError, Result};
use crate::utils::{crypto_hash, current_timestamp, ecdsa_p256_sha256_sign_verify};
use crate::wallet::Wallet;
use data_encoding::HEXLOWER;
use log::error;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Fixed input carried by every reward transaction. The sentinel address
/// is not a hex public key, so no signature can ever verify against it;
/// reward transactions are instead bounded by the one-per-block rule
/// during chain validation.
pub static REWARD_INPUT: Lazy<TransactionInput> = Lazy::new(|| TransactionInput {
    timestamp: 0,
    amount: MINING_REWARD,
    address: REWARD_ADDRESS.to_string(),
    signature: vec![],
});

/// Provenance of a transaction: the sender's claimed balance at signing
/// time, the sender's address, and a signature over the output map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub(crate) timestamp: i64,
    pub(crate) amount: u64,
    pub(crate) address: String,
    pub(crate) signature: Vec<u8>,
}

impl TransactionInput {
    /// Sign the output map with the sender's key. `amount` is the balance
    /// the sender claims; it must equal the output-map total for the
    /// transaction to validate.
    pub fn new(sender: &Wallet, amount: u64, output_map: &BTreeMap<String, u64>) -> Result<Self> {
        let digest = output_map_digest(output_map)?;
        Ok(TransactionInput {
            timestamp: current_timestamp()?,
            amount,
            address: sender.address(),
            signature: sender.sign(digest.as_bytes())?,
        })
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }
}

/// A signed value transfer: a map from recipient address to amount, plus
/// the change entry routing the sender's remaining balance back to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) output_map: BTreeMap<String, u64>,
    pub(crate) input: TransactionInput,
}

impl Transaction {
    /// Build a transfer of `amount` from `sender` to `recipient`, with the
    /// remainder of `sender_balance` as the sender's change output. Fails
    /// before constructing anything if the balance does not cover the
    /// amount.
    pub fn new(
        sender: &Wallet,
        recipient: &str,
        amount: u64,
        sender_balance: u64,
    ) -> Result<Transaction> {
        if amount > sender_balance {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available: sender_balance,
            });
        }

        let mut output_map = BTreeMap::new();
        output_map.insert(recipient.to_string(), amount);
        output_map.insert(sender.address(), sender_balance - amount);

        let input = TransactionInput::new(sender, sender_balance, &output_map)?;

        Ok(Transaction {
            id: Uuid::new_v4().to_string(),
            output_map,
            input,
        })
    }

    /// Route `amount` more to `recipient` out of the sender's remaining
    /// change output, then re-derive the input: fresh timestamp, fresh
    /// signature over the whole mutated map, claimed amount unchanged.
    /// Fails without touching the transaction if the remaining output does
    /// not cover the amount.
    pub fn update(&mut self, sender: &Wallet, recipient: &str, amount: u64) -> Result<()> {
        let sender_address = sender.address();
        let remaining = self.output_map.get(&sender_address).copied().unwrap_or(0);

        if amount > remaining {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available: remaining,
            });
        }

        *self.output_map.entry(recipient.to_string()).or_insert(0) += amount;
        self.output_map.insert(sender_address, remaining - amount);
        self.input = TransactionInput::new(sender, self.input.amount, &self.output_map)?;

        Ok(())
    }

    /// Fixed-input transaction crediting the mining reward to `miner`.
    pub fn reward_transaction(miner: &Wallet) -> Transaction {
        let mut output_map = BTreeMap::new();
        output_map.insert(miner.address(), MINING_REWARD);

        Transaction {
            id: Uuid::new_v4().to_string(),
            output_map,
            input: REWARD_INPUT.clone(),
        }
    }

    /// Whether this transaction carries the reward sentinel input.
    pub fn is_reward(&self) -> bool {
        self.input.address == REWARD_ADDRESS
    }

    /// Validation predicate: the output total must equal the claimed input
    /// amount, and the signature must verify over the output map against
    /// the input address. Logs the first failing rule and returns false;
    /// never panics or errors.
    pub fn validate(&self) -> bool {
        let address = self.input.get_address();

        let mut output_total: u64 = 0;
        for value in self.output_map.values() {
            output_total = match output_total.checked_add(*value) {
                Some(sum) => sum,
                None => {
                    error!("Output total overflow in transaction from {address}");
                    return false;
                }
            };
        }

        if output_total != self.input.amount {
            error!(
                "Invalid transaction from {address}: outputs total {output_total}, input claims {}",
                self.input.amount
            );
            return false;
        }

        let digest = match output_map_digest(&self.output_map) {
            Ok(digest) => digest,
            Err(e) => {
                error!("Failed to serialize output map for transaction from {address}: {e}");
                return false;
            }
        };

        let public_key = match HEXLOWER.decode(address.as_bytes()) {
            Ok(bytes) => bytes,
            Err(_) => {
                error!("Invalid signature from {address}: address is not a hex public key");
                return false;
            }
        };

        if !ecdsa_p256_sha256_sign_verify(&public_key, &self.input.signature, digest.as_bytes()) {
            error!("Invalid signature from {address}");
            return false;
        }

        true
    }

    pub fn get_id(&self) -> &str {
        self.id.as_str()
    }

    pub fn get_output_map(&self) -> &BTreeMap<String, u64> {
        &self.output_map
    }

    pub fn get_input(&self) -> &TransactionInput {
        &self.input
    }
}

/// Signable digest of an output map: the hash oracle over its canonical
/// JSON form. `BTreeMap` keeps the key order stable between signing and
/// verification.
pub(crate) fn output_map_digest(output_map: &BTreeMap<String, u64>) -> Result<String> {
    Ok(crypto_hash(&[serde_json::to_value(output_map)?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STARTING_BALANCE;

    fn transfer() -> (Wallet, String, Transaction) {
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap().address();
        let transaction = Transaction::new(&sender, &recipient, 50, STARTING_BALANCE).unwrap();
        (sender, recipient, transaction)
    }

    #[test]
    fn test_outputs_amount_to_recipient_and_change_to_sender() {
        let (sender, recipient, transaction) = transfer();

        assert_eq!(transaction.get_output_map()[&recipient], 50);
        assert_eq!(
            transaction.get_output_map()[&sender.address()],
            STARTING_BALANCE - 50
        );
    }

    #[test]
    fn test_input_records_sender_balance_and_address() {
        let (sender, _, transaction) = transfer();

        assert_eq!(transaction.get_input().get_amount(), STARTING_BALANCE);
        assert_eq!(transaction.get_input().get_address(), sender.address());
        assert!(transaction.validate());
    }

    #[test]
    fn test_rejects_amount_exceeding_balance() {
        let sender = Wallet::new().unwrap();

        let result = Transaction::new(&sender, "recipient", STARTING_BALANCE + 1, STARTING_BALANCE);

        assert!(matches!(
            result,
            Err(BlockchainError::InsufficientFunds {
                required,
                available,
            }) if required == STARTING_BALANCE + 1 && available == STARTING_BALANCE
        ));
    }

    #[test]
    fn test_invalid_when_an_output_value_is_tampered() {
        let (sender, _, mut transaction) = transfer();

        transaction
            .output_map
            .insert(sender.address(), 999_999);

        assert!(!transaction.validate());
    }

    #[test]
    fn test_invalid_when_the_signature_is_tampered() {
        let (_, _, mut transaction) = transfer();
        let intruder = Wallet::new().unwrap();

        transaction.input.signature = intruder.sign(b"forged-data").unwrap();

        assert!(!transaction.validate());
    }

    #[test]
    fn test_update_moves_value_and_resigns() {
        let (sender, recipient, mut transaction) = transfer();
        let next_recipient = Wallet::new().unwrap().address();
        let original_signature = transaction.get_input().get_signature().to_vec();

        transaction.update(&sender, &next_recipient, 30).unwrap();

        assert_eq!(transaction.get_output_map()[&next_recipient], 30);
        assert_eq!(
            transaction.get_output_map()[&sender.address()],
            STARTING_BALANCE - 50 - 30
        );
        assert_eq!(transaction.get_output_map()[&recipient], 50);
        assert_eq!(transaction.get_input().get_amount(), STARTING_BALANCE);
        assert_ne!(
            transaction.get_input().get_signature().to_vec(),
            original_signature
        );
        assert!(transaction.validate());
    }

    #[test]
    fn test_update_accumulates_for_a_repeated_recipient() {
        let (sender, recipient, mut transaction) = transfer();

        transaction.update(&sender, &recipient, 25).unwrap();

        assert_eq!(transaction.get_output_map()[&recipient], 75);
        assert!(transaction.validate());
    }

    #[test]
    fn test_update_beyond_remaining_output_leaves_transaction_unchanged() {
        let (sender, _, mut transaction) = transfer();
        let before = transaction.clone();

        let result = transaction.update(&sender, "someone", STARTING_BALANCE);

        assert!(matches!(
            result,
            Err(BlockchainError::InsufficientFunds { .. })
        ));
        assert_eq!(transaction, before);
    }

    #[test]
    fn test_reward_transaction_shape() {
        let miner = Wallet::new().unwrap();

        let reward = Transaction::reward_transaction(&miner);

        assert!(reward.is_reward());
        assert_eq!(reward.get_input(), &*REWARD_INPUT);
        assert_eq!(reward.get_output_map().len(), 1);
        assert_eq!(reward.get_output_map()[&miner.address()], MINING_REWARD);
    }
}
