//! Service configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use atm_ledger::OverdraftPolicy;
use atm_session::SessionPolicy;

use crate::error::CoreError;
use crate::Result;

/// Longest session lifetime accepted from configuration (one year)
pub const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Session lifetime after creation or renewal, in seconds
    pub session_ttl_secs: i64,
    /// Validation renews a session with less than this many seconds left
    pub renewal_threshold_secs: i64,
    /// Let withdrawals take a balance below zero
    pub allow_overdraft: bool,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("atm.db"),
            bind_address: "0.0.0.0:8080".to_string(),
            session_ttl_secs: 600,
            renewal_threshold_secs: 60,
            allow_overdraft: false,
        }
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_secs <= 0 || self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(CoreError::Config(format!(
                "session_ttl_secs must be in (0, {MAX_SESSION_TTL_SECS}]"
            )));
        }
        if self.renewal_threshold_secs < 0 || self.renewal_threshold_secs >= self.session_ttl_secs
        {
            return Err(CoreError::Config(format!(
                "renewal_threshold_secs must be in [0, {})",
                self.session_ttl_secs
            )));
        }
        Ok(())
    }

    pub fn session_policy(&self) -> Result<SessionPolicy> {
        let ttl = Duration::try_seconds(self.session_ttl_secs).ok_or_else(|| {
            CoreError::Config(format!("session_ttl_secs out of range: {}", self.session_ttl_secs))
        })?;
        let threshold = Duration::try_seconds(self.renewal_threshold_secs).ok_or_else(|| {
            CoreError::Config(format!(
                "renewal_threshold_secs out of range: {}",
                self.renewal_threshold_secs
            ))
        })?;
        Ok(SessionPolicy::new(ttl, threshold))
    }

    pub fn overdraft_policy(&self) -> OverdraftPolicy {
        if self.allow_overdraft {
            OverdraftPolicy::Allow
        } else {
            OverdraftPolicy::Reject
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("ATM"))
            .unwrap_or_else(|| PathBuf::from(".atm"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
