//! Application state shared by every request handler
use atm_core::{Atm, CoreError};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    atm: Atm,
}

impl AppState {
    pub fn new(atm: Atm) -> Self {
        Self { atm }
    }

    pub fn atm(&self) -> &Atm {
        &self.atm
    }

    /// Run a ledger call on the blocking pool.
    ///
    /// Ledger calls hold the database mutex for the whole SQLite transaction,
    /// which must not stall the async workers.
    pub async fn with_atm<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Atm) -> Result<T, CoreError> + Send + 'static,
        T: Send + 'static,
    {
        let atm = self.atm.clone();
        tokio::task::spawn_blocking(move || f(&atm))
            .await
            .map_err(|e| ApiError::Internal(format!("ledger task failed: {e}")))?
            .map_err(ApiError::from)
    }
}
