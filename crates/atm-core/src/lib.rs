//! ATM Core
//!
//! Central coordination layer for the ATM service. The session manager and
//! the ledger never call each other; [`Atm`] sequences them for the
//! transport layer.

mod atm;
mod config;
mod error;

pub use atm::Atm;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use atm_ledger::{
    Account, Ledger, LedgerEntry, LedgerError, OverdraftPolicy, Transaction, TransactionKind,
};
pub use atm_session::{Session, SessionError, SessionId, SessionManager, SessionPolicy};
pub use atm_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
