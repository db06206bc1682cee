//! ATM Ledger
//!
//! Pairs each account's running balance with the log of every transaction
//! that produced it. A deposit or withdrawal updates both in one SQLite
//! transaction: either the balance and the log entry are both written, or
//! neither is.

mod error;
mod ledger;
mod transaction;

pub use atm_storage::Account;
pub use error::LedgerError;
pub use ledger::Ledger;
pub use transaction::{LedgerEntry, OverdraftPolicy, Transaction, TransactionKind};

pub type Result<T> = std::result::Result<T, LedgerError>;
