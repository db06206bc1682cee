//! Session check for authenticated routes

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use atm_core::{CoreError, SessionError};

use crate::error::ApiError;
use crate::state::AppState;

/// Validate the session token and hand the `Session` to the handler through
/// request extensions. Validation may renew a session close to expiry.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers())?;
    let session = state.atm().authenticate(token)?;

    tracing::debug!(session_id = %session.id, account = %session.account, "Authenticated request");

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

fn extract_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingAuthorization)?;

    let header = header.to_str().map_err(|_| {
        ApiError::Core(CoreError::Session(SessionError::MalformedToken(
            String::from_utf8_lossy(header.as_bytes()).into_owned(),
        )))
    })?;

    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() {
        return Err(ApiError::MissingAuthorization);
    }

    Ok(token)
}
