//! Service state container
//!
//! The transport layer talks to this type only. It resolves PINs through the
//! ledger, mints sessions, and scopes every balance call to the account of a
//! session that was validated first.

use atm_ledger::{Ledger, LedgerEntry};
use atm_session::{Session, SessionManager};
use atm_storage::Database;

use crate::config::Config;
use crate::Result;

pub struct Atm {
    /// Configuration
    config: Config,
    /// Account balances and transaction log
    ledger: Ledger,
    /// Live sessions
    session_manager: SessionManager,
}

impl Atm {
    /// Open the configured database and build both components
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    /// Build on an already opened database
    pub fn with_database(config: Config, db: Database) -> Result<Self> {
        config.validate()?;

        let ledger = Ledger::new(db, config.overdraft_policy());
        let session_manager = SessionManager::new(config.session_policy()?);

        tracing::info!(
            database = %config.database_path.display(),
            session_ttl_secs = config.session_ttl_secs,
            allow_overdraft = config.allow_overdraft,
            "ATM service initialized"
        );

        Ok(Self {
            config,
            ledger,
            session_manager,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    /// Check a PIN and issue a session for its account
    pub fn login(&self, pin: &str) -> Result<Session> {
        let account = self.ledger.resolve_account(pin)?;
        Ok(self.session_manager.create_session(account))
    }

    /// Validate a raw session token presented by a client
    pub fn authenticate(&self, token: &str) -> Result<Session> {
        Ok(self.session_manager.validate_token(token)?)
    }

    pub fn balance(&self, session: &Session) -> Result<i64> {
        Ok(self.ledger.balance(session.account)?)
    }

    pub fn deposit(&self, session: &Session, amount: i64) -> Result<LedgerEntry> {
        Ok(self.ledger.deposit(session.account, amount)?)
    }

    pub fn withdraw(&self, session: &Session, amount: i64) -> Result<LedgerEntry> {
        Ok(self.ledger.withdraw(session.account, amount)?)
    }

    pub fn transactions(&self, session: &Session) -> Result<Vec<LedgerEntry>> {
        Ok(self.ledger.transactions(session.account)?)
    }
}

impl Clone for Atm {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            ledger: self.ledger.clone(),
            session_manager: self.session_manager.clone(),
        }
    }
}
