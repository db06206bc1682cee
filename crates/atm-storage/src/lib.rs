//! ATM Storage Layer
//!
//! SQLite-based persistence for account balances and the transaction log.
//! Every balance mutation goes through [`Database::transaction_immediate`] so
//! the balance row and its log entry commit or roll back together.

mod account;
mod database;
mod error;
mod migrations;

pub use account::Account;
pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
