use crate::config::STARTING_BALANCE;
use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use crate::wallet::calculate_balance;
use data_encoding::HEXLOWER;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};

/// A signing identity. The balance is never stored here; it is derived
/// from the chain at the moment a transaction is created or updated.
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = crate::utils::new_key_pair()?;
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .map_err(|e| {
                    BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
                })?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        Ok(Wallet { pkcs8, public_key })
    }

    /// Lowercase-hex encoding of the raw public key. This doubles as the
    /// account address: output maps key on it, and transaction validation
    /// decodes it back into the verification key.
    pub fn address(&self) -> String {
        HEXLOWER.encode(self.public_key.as_slice())
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        crate::utils::ecdsa_p256_sha256_sign_digest(self.pkcs8.as_slice(), message)
    }

    /// Create a transfer to `recipient`. When a chain is supplied the
    /// sender's balance is recomputed from it first; without one the fixed
    /// starting balance applies. Fails with `InsufficientFunds` before any
    /// construction if the balance does not cover `amount`.
    pub fn create_transaction(
        &self,
        recipient: &str,
        amount: u64,
        chain: Option<&[Block]>,
    ) -> Result<Transaction> {
        let balance = match chain {
            Some(chain) => calculate_balance(chain, &self.address()),
            None => STARTING_BALANCE,
        };
        Transaction::new(self, recipient, amount, balance)
    }

    /// The wallet's spendable balance on `chain`.
    pub fn balance(&self, chain: &[Block]) -> u64 {
        calculate_balance(chain, &self.address())
    }
}
