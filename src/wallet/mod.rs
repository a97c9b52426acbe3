//! Wallet identity and balance derivation
//!
//! Key management, transaction creation, and the history-scan balance
//! calculator.

pub mod balance;
pub mod wallet;

pub use balance::calculate_balance;
pub use wallet::Wallet;
