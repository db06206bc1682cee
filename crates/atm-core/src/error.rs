//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] atm_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] atm_session::SessionError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] atm_ledger::LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
