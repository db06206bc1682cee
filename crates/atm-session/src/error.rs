//! Session error types

use thiserror::Error;

use crate::session::SessionId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session expired: {0}")]
    Expired(SessionId),

    #[error("Malformed session token: {0}")]
    MalformedToken(String),
}
