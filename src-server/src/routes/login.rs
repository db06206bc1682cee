//! PIN login

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Exchange a PIN (`nip` header) for a session token (`SessionID` header)
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let pin = headers
        .get("nip")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingPin)?
        .to_string();

    let session = state.with_atm(move |atm| atm.login(&pin)).await?;

    tracing::info!(session_id = %session.id, account = %session.account, "Login succeeded");

    Ok(([("SessionID", session.id.to_string())], "").into_response())
}
