//! Database models for refresh sessions.

use chrono::{DateTime, Utc};

use crate::types::UserId;

/// Database request for issuing (or replacing) a user's refresh session.
///
/// Only the digest of the secret is ever stored.
#[derive(Debug, Clone)]
pub struct RefreshSessionCreateDBRequest {
    pub secret_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// A stored refresh session; at most one exists per user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshSession {
    pub user_id: UserId,
    pub secret_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
