//! Session Manager
//!
//! Owns every live session of the process. All state sits behind one
//! `RwLock`: lookups share the read side, while create, validate, renew and
//! purge take the write side. A single coarse lock keeps validate-then-renew
//! atomic at the cost of serializing validations.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use atm_storage::Account;

use crate::error::SessionError;
use crate::session::{Session, SessionId};
use crate::Result;

/// Expiry rules applied to every session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Lifetime granted on creation and on each renewal
    pub ttl: Duration,
    /// Validation renews a session whose remaining lifetime is below this
    pub renewal_threshold: Duration,
}

impl SessionPolicy {
    pub fn new(ttl: Duration, renewal_threshold: Duration) -> Self {
        Self {
            ttl,
            renewal_threshold,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(10),
            renewal_threshold: Duration::minutes(1),
        }
    }
}

pub struct SessionManager {
    /// Session table keyed by token
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    /// Issue a session for an authenticated account
    pub fn create_session(&self, account: Account) -> Session {
        self.create_session_at(account, Utc::now())
    }

    pub fn create_session_at(&self, account: Account, now: DateTime<Utc>) -> Session {
        let mut sessions = self.sessions.write();

        let mut session = Session::new_at(account, self.policy.ttl, now);
        while sessions.contains_key(&session.id) {
            session.id = SessionId::new();
        }
        sessions.insert(session.id, session.clone());

        tracing::info!(
            session_id = %session.id,
            account = %session.account,
            expires_at = %session.expires_at,
            "Created session"
        );

        session
    }

    /// Classify a presented token.
    ///
    /// Returns the session when it is still valid, renewing it in place when
    /// its remaining lifetime is under the renewal threshold. Expired entries
    /// are reported but left in the table.
    pub fn validate(&self, id: &SessionId) -> Result<Session> {
        self.validate_at(id, Utc::now())
    }

    pub fn validate_at(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Session> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or(SessionError::NotFound(*id))?;

        if session.is_expired_at(now) {
            tracing::debug!(session_id = %id, "Rejected expired session");
            return Err(SessionError::Expired(*id));
        }

        if session.remaining_at(now) < self.policy.renewal_threshold {
            session.renew_at(self.policy.ttl, now);
            tracing::debug!(
                session_id = %id,
                expires_at = %session.expires_at,
                "Auto-renewed session"
            );
        }

        Ok(session.clone())
    }

    /// Parse a raw token and validate it
    pub fn validate_token(&self, token: &str) -> Result<Session> {
        let id = parse_token(token)?;
        self.validate(&id)
    }

    /// Extend a live session to a full TTL from now.
    ///
    /// A session already past its expiry stays expired.
    pub fn renew(&self, id: &SessionId) -> Result<Session> {
        self.renew_at(id, Utc::now())
    }

    pub fn renew_at(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Session> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or(SessionError::NotFound(*id))?;

        if session.is_expired_at(now) {
            return Err(SessionError::Expired(*id));
        }

        session.renew_at(self.policy.ttl, now);
        Ok(session.clone())
    }

    /// Look up a session without classifying or renewing it
    pub fn get_session(&self, id: &SessionId) -> Result<Session> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or(SessionError::NotFound(*id))
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "Purged expired sessions");
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            policy: self.policy,
        }
    }
}

/// Turn a client-supplied token into a [`SessionId`]
pub fn parse_token(token: &str) -> Result<SessionId> {
    token
        .parse()
        .map_err(|_| SessionError::MalformedToken(token.to_string()))
}
