//! Ledger error types

use thiserror::Error;

use atm_storage::Account;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid credential")]
    AuthenticationFailed,

    #[error("Account not found: {0}")]
    AccountNotFound(Account),

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Insufficient funds on account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: Account,
        balance: i64,
        requested: i64,
    },

    #[error("Credential already assigned to another account")]
    DuplicateCredential,

    #[error("Storage error: {0}")]
    Storage(#[from] atm_storage::StorageError),
}
