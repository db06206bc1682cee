//! ATM HTTP server
//!
//! Loads configuration, seeds accounts, starts the session purge task and
//! serves the router.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use atm_core::{Atm, CoreError, LedgerError};
use atm_server::{build_router, cli::Cli, AppState};

/// How often expired sessions are dropped from memory
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    atm_core::init_logging();

    let cli = Cli::parse();
    let config = cli.to_config().context("invalid configuration")?;
    let bind_address = config.bind_address.clone();

    let atm = Atm::new(config).context("failed to open the ledger database")?;

    for seed in &cli.seeds {
        match atm.ledger().open_account(&seed.pin, seed.balance) {
            Ok(account) => tracing::info!(account = %account, "Seeded account"),
            Err(LedgerError::DuplicateCredential) => {
                tracing::info!("Seed PIN already provisioned, skipping")
            }
            Err(e) => return Err(CoreError::from(e)).context("failed to seed account"),
        }
    }

    let sessions = atm.session_manager().clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.purge_expired();
        }
    });

    let app = build_router(AppState::new(atm));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
