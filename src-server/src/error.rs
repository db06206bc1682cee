//! Mapping of core outcomes to HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use atm_core::{CoreError, LedgerError, SessionError, TransactionKind};

#[derive(Debug)]
pub enum ApiError {
    /// Login request without a `nip` header
    MissingPin,
    /// Authenticated route without an `Authorization` header
    MissingAuthorization,
    /// Request body is not a JSON integer
    MalformedAmount(String),
    /// Storage failed while applying a transaction; nothing was written
    TransactionFailed(TransactionKind),
    Core(CoreError),
    Internal(String),
}

impl ApiError {
    /// Classify a failure of a deposit or withdrawal
    pub fn transaction(kind: TransactionKind, err: CoreError) -> Self {
        match err {
            CoreError::Ledger(LedgerError::Storage(_)) | CoreError::Storage(_) => {
                ApiError::TransactionFailed(kind)
            }
            other => ApiError::Core(other),
        }
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::MissingPin => (StatusCode::BAD_REQUEST, "missing header: 'nip'".to_string()),
            ApiError::MissingAuthorization => {
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }
            ApiError::MalformedAmount(_) => (StatusCode::BAD_REQUEST, "invalid amount".to_string()),
            ApiError::TransactionFailed(kind) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to perform {kind}"),
            ),
            ApiError::Core(err) => core_status(err),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        }
    }
}

fn core_status(err: &CoreError) -> (StatusCode, String) {
    match err {
        CoreError::Session(SessionError::MalformedToken(_)) => {
            (StatusCode::BAD_REQUEST, "invalid authorization".to_string())
        }
        CoreError::Session(SessionError::NotFound(_)) => {
            (StatusCode::UNAUTHORIZED, "invalid authorization".to_string())
        }
        CoreError::Session(SessionError::Expired(_)) => {
            (StatusCode::UNAUTHORIZED, "session expired".to_string())
        }
        CoreError::Ledger(LedgerError::AuthenticationFailed) => {
            (StatusCode::BAD_REQUEST, "invalid nip".to_string())
        }
        CoreError::Ledger(LedgerError::AccountNotFound(_)) => {
            (StatusCode::NOT_FOUND, "account not found".to_string())
        }
        CoreError::Ledger(LedgerError::InvalidAmount(_)) => {
            (StatusCode::BAD_REQUEST, "invalid amount".to_string())
        }
        CoreError::Ledger(LedgerError::InsufficientFunds { .. }) => {
            (StatusCode::CONFLICT, "insufficient funds".to_string())
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        ),
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::MissingPin => write!(f, "missing nip header"),
            ApiError::MissingAuthorization => write!(f, "missing authorization header"),
            ApiError::MalformedAmount(reason) => write!(f, "malformed amount: {reason}"),
            ApiError::TransactionFailed(kind) => write!(f, "{kind} failed in storage"),
            ApiError::Core(err) => write!(f, "{err}"),
            ApiError::Internal(reason) => write!(f, "{reason}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, message).into_response()
    }
}
