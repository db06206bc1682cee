//! ATM Session Management
//!
//! - A Session is a time-bounded proof that a PIN check succeeded
//! - Sessions live in memory only and do not survive a restart
//! - Validation renews a session that is about to expire
//! - Expired sessions are never resurrected

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::{parse_token, SessionManager, SessionPolicy};
pub use session::{Session, SessionId};

pub type Result<T> = std::result::Result<T, SessionError>;
