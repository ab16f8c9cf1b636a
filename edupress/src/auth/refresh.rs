//! Refresh session lifecycle: issue, look up and revoke opaque long-lived secrets.
//!
//! Each user has at most one refresh session. Issuing a new one replaces whatever was there,
//! which logs out any other device. The raw secret is handed to the client once; storage only
//! ever sees its digest.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::instrument;

use crate::{
    auth::password,
    db::{
        AuthStore,
        models::refresh_sessions::{RefreshSession, RefreshSessionCreateDBRequest},
    },
    errors::Result,
    types::UserId,
};

/// A freshly issued refresh secret, returned to the client exactly once
#[derive(Clone)]
pub struct IssuedRefreshSession {
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for IssuedRefreshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedRefreshSession")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Clone)]
pub struct RefreshSessionStore {
    store: Arc<dyn AuthStore>,
    lifetime: Duration,
}

impl RefreshSessionStore {
    pub fn new(store: Arc<dyn AuthStore>, lifetime: Duration) -> Self {
        Self { store, lifetime }
    }

    /// Generate a secret and the storage request for it, without persisting anything.
    ///
    /// Used directly by signup, which writes the session in the same transaction as the user.
    pub fn mint(&self) -> (IssuedRefreshSession, RefreshSessionCreateDBRequest) {
        let secret = password::generate_refresh_secret();
        // TIMESTAMPTZ keeps microseconds
        let expires_at = (Utc::now() + self.lifetime).trunc_subsecs(6);
        let request = RefreshSessionCreateDBRequest {
            secret_hash: password::digest_secret(&secret),
            expires_at,
        };

        (IssuedRefreshSession { secret, expires_at }, request)
    }

    /// Issue a session for `user_id`, replacing any existing one
    #[instrument(skip(self), err)]
    pub async fn issue_for(&self, user_id: UserId) -> Result<IssuedRefreshSession> {
        let (issued, request) = self.mint();
        self.store.upsert_session(user_id, &request).await?;

        Ok(issued)
    }

    #[instrument(skip_all, err)]
    pub async fn find_by_secret(&self, secret: &str) -> Result<Option<RefreshSession>> {
        Ok(self.store.get_session_by_secret_hash(&password::digest_secret(secret)).await?)
    }

    /// Idempotent; returns whether a session was removed
    #[instrument(skip(self), err)]
    pub async fn revoke_for(&self, user_id: UserId) -> Result<bool> {
        Ok(self.store.delete_session_for_user(user_id).await?)
    }

    /// Idempotent; returns whether a session was removed
    #[instrument(skip_all, err)]
    pub async fn revoke_by_secret(&self, secret: &str) -> Result<bool> {
        Ok(self.store.delete_session_by_secret_hash(&password::digest_secret(secret)).await?)
    }
}
