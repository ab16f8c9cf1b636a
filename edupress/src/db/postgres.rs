//! PostgreSQL storage backend built on the table repositories.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    api::models::users::Identity,
    db::{
        errors::Result,
        handlers::{RefreshSessions, Users},
        models::{
            refresh_sessions::{RefreshSession, RefreshSessionCreateDBRequest},
            users::{Credential, UserCreateDBRequest},
        },
        store::{AuthStore, CredentialStore, SessionStore},
    },
    types::UserId,
};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn create_identity(&self, request: &UserCreateDBRequest) -> Result<Identity> {
        let mut tx = self.pool.begin().await?;
        let user = Users::new(&mut tx).create(request).await?;
        tx.commit().await?;

        Ok(Credential::from(user).identity)
    }

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>> {
        Ok(self.get_credential(id).await?.map(|c| c.identity))
    }

    async fn get_credential(&self, id: UserId) -> Result<Option<Credential>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Users::new(&mut conn).get_by_id(id).await?.map(Credential::from))
    }

    async fn get_credential_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Users::new(&mut conn).get_user_by_email(email).await?.map(Credential::from))
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).update_password_hash(id, password_hash).await
    }

    async fn delete_identity(&self, id: UserId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).delete(id).await
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn upsert_session(&self, user_id: UserId, request: &RefreshSessionCreateDBRequest) -> Result<RefreshSession> {
        let mut conn = self.pool.acquire().await?;
        RefreshSessions::new(&mut conn).upsert(user_id, request).await
    }

    async fn get_session_by_secret_hash(&self, secret_hash: &str) -> Result<Option<RefreshSession>> {
        let mut conn = self.pool.acquire().await?;
        RefreshSessions::new(&mut conn).get_by_secret_hash(secret_hash).await
    }

    async fn delete_session_for_user(&self, user_id: UserId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        RefreshSessions::new(&mut conn).delete_for_user(user_id).await
    }

    async fn delete_session_by_secret_hash(&self, secret_hash: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        RefreshSessions::new(&mut conn).delete_by_secret_hash(secret_hash).await
    }
}

#[async_trait]
impl AuthStore for PostgresStore {
    async fn create_identity_with_session(
        &self,
        request: &UserCreateDBRequest,
        session: &RefreshSessionCreateDBRequest,
    ) -> Result<(Identity, RefreshSession)> {
        let mut tx = self.pool.begin().await?;

        let user = Users::new(&mut tx).create(request).await?;
        let identity = Credential::from(user).identity;
        let session = RefreshSessions::new(&mut tx).upsert(identity.id, session).await?;

        // Uncommitted transactions roll back on drop
        tx.commit().await?;
        Ok((identity, session))
    }
}
