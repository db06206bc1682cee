//! Balance, deposit, withdrawal and log handlers

use axum::{body::Bytes, extract::State, Extension, Json};
use serde::Serialize;

use atm_core::{LedgerEntry, Session, TransactionKind};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EntryInfo {
    pub id: i64,
    pub kind: TransactionKind,
    pub amount: i64,
    pub created_at: String,
}

impl From<LedgerEntry> for EntryInfo {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind(),
            amount: entry.amount,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Balance of the session's account, rendered as a bare integer
pub async fn balance(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<String, ApiError> {
    let balance = state.with_atm(move |atm| atm.balance(&session)).await?;
    Ok(balance.to_string())
}

pub async fn deposit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    apply(state, session, TransactionKind::Deposit, &body).await
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    apply(state, session, TransactionKind::Withdrawal, &body).await
}

/// Log of the session's account, oldest first
pub async fn transactions(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<EntryInfo>>, ApiError> {
    let entries = state.with_atm(move |atm| atm.transactions(&session)).await?;
    Ok(Json(entries.into_iter().map(EntryInfo::from).collect()))
}

async fn apply(
    state: AppState,
    session: Session,
    kind: TransactionKind,
    body: &[u8],
) -> Result<&'static str, ApiError> {
    // Rejected before any storage access
    let amount = parse_amount(body)?;

    state
        .with_atm(move |atm| match kind {
            TransactionKind::Deposit => atm.deposit(&session, amount),
            TransactionKind::Withdrawal => atm.withdraw(&session, amount),
        })
        .await
        .map_err(|err| match err {
            ApiError::Core(core) => ApiError::transaction(kind, core),
            other => other,
        })?;

    Ok("ok")
}

/// Decode a JSON integer amount. Negative magnitudes are malformed.
fn parse_amount(body: &[u8]) -> Result<i64, ApiError> {
    let amount: i64 =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedAmount(e.to_string()))?;

    if amount < 0 {
        return Err(ApiError::MalformedAmount(format!(
            "amount must not be negative, got {amount}"
        )));
    }

    Ok(amount)
}
