//! Session data structure

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atm_storage::Account;

/// Opaque session token.
///
/// Renders as a hyphenated UUID and parses back from the same text, so it
/// survives any text transport unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique token handed to the client
    pub id: SessionId,
    /// Account authenticated by this session
    pub account: Account,
    /// When the PIN check succeeded
    pub created_at: DateTime<Utc>,
    /// Absolute expiry; the session is unusable at or after this instant
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new_at(account: Account, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            account,
            created_at: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, negative once expired
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    pub(crate) fn renew_at(&mut self, ttl: Duration, now: DateTime<Utc>) {
        self.expires_at = expiry_after(now, ttl);
    }
}

/// `now + ttl`, saturating at the latest representable instant
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let now = Utc::now();
        let session = Session::new_at(Account::new(7), Duration::minutes(10), now);

        assert_eq!(session.account, Account::new(7));
        assert_eq!(session.created_at, now);
        assert_eq!(session.expires_at, now + Duration::minutes(10));
        assert!(session.expires_at >= session.created_at);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let session = Session::new_at(Account::new(1), Duration::minutes(10), now);

        assert!(!session.is_expired_at(now + Duration::minutes(10) - Duration::milliseconds(1)));
        assert!(session.is_expired_at(now + Duration::minutes(10)));
        assert!(session.is_expired_at(now + Duration::minutes(11)));
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_overflowing() {
        let now = Utc::now();
        let ttl = Duration::seconds(10_000_000_000_000);

        let mut session = Session::new_at(Account::new(1), ttl, now);
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!session.is_expired_at(now));

        session.renew_at(ttl, now + Duration::minutes(1));
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_id_text_round_trip() {
        let id = SessionId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<SessionId>().unwrap(), id);
    }

    #[test]
    fn test_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<SessionId>().is_err());
        assert!("".parse::<SessionId>().is_err());
    }
}
