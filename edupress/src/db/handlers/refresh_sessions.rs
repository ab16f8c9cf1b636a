//! Database repository for refresh sessions.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::refresh_sessions::{RefreshSession, RefreshSessionCreateDBRequest},
    },
    types::UserId,
};

pub struct RefreshSessions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> RefreshSessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Single-statement upsert keyed by `user_id`; concurrent logins leave exactly one row.
    #[instrument(skip(self, request), err)]
    pub async fn upsert(&mut self, user_id: UserId, request: &RefreshSessionCreateDBRequest) -> Result<RefreshSession> {
        let session = sqlx::query_as::<_, RefreshSession>(
            r#"
            INSERT INTO refresh_sessions (user_id, secret_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET secret_hash = EXCLUDED.secret_hash,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
            RETURNING user_id, secret_hash, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(&request.secret_hash)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip_all, err)]
    pub async fn get_by_secret_hash(&mut self, secret_hash: &str) -> Result<Option<RefreshSession>> {
        let session = sqlx::query_as::<_, RefreshSession>(
            "SELECT user_id, secret_hash, expires_at, created_at FROM refresh_sessions WHERE secret_hash = $1",
        )
        .bind(secret_hash)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_for_user(&mut self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, err)]
    pub async fn delete_by_secret_hash(&mut self, secret_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE secret_hash = $1")
            .bind(secret_hash)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
