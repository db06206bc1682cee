//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

use atm_core::{Config, CoreError};

#[derive(Debug, Parser)]
#[command(name = "atm", version, about = "Run the ATM service")]
pub struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long, env = "ATM_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, env = "ATM_DATABASE")]
    pub database: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "ATM_BIND")]
    pub bind: Option<String>,

    /// Session lifetime in seconds
    #[arg(long, env = "ATM_SESSION_TTL")]
    pub session_ttl: Option<i64>,

    /// Renew sessions with fewer than this many seconds left
    #[arg(long, env = "ATM_RENEWAL_THRESHOLD")]
    pub renewal_threshold: Option<i64>,

    /// Allow withdrawals to take balances below zero
    #[arg(long, env = "ATM_ALLOW_OVERDRAFT")]
    pub allow_overdraft: bool,

    /// Provision an account at startup, as PIN:BALANCE (repeatable)
    #[arg(long = "seed", value_name = "PIN:BALANCE", value_parser = parse_seed)]
    pub seeds: Vec<Seed>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub pin: String,
    pub balance: i64,
}

fn parse_seed(raw: &str) -> Result<Seed, String> {
    let (pin, balance) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected PIN:BALANCE, got '{raw}'"))?;

    if pin.is_empty() {
        return Err("PIN must not be empty".to_string());
    }

    let balance = balance
        .parse()
        .map_err(|e| format!("invalid balance '{balance}': {e}"))?;

    Ok(Seed {
        pin: pin.to_string(),
        balance,
    })
}

impl Cli {
    /// Resolve the effective configuration: defaults, then file, then flags
    pub fn to_config(&self) -> Result<Config, CoreError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(ttl) = self.session_ttl {
            config.session_ttl_secs = ttl;
        }
        if let Some(threshold) = self.renewal_threshold {
            config.renewal_threshold_secs = threshold;
        }
        if self.allow_overdraft {
            config.allow_overdraft = true;
        }

        config.validate()?;
        Ok(config)
    }
}
