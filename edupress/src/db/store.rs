//! Storage seam used by the session manager and the request authenticator.
//!
//! [`crate::db::postgres::PostgresStore`] implements it over one repository per table, against
//! either an external or an embedded database.
//!
//! Emails passed to these methods are expected to be normalized already.

use async_trait::async_trait;

use crate::{
    api::models::users::Identity,
    db::{
        errors::Result,
        models::{
            refresh_sessions::{RefreshSession, RefreshSessionCreateDBRequest},
            users::{Credential, UserCreateDBRequest},
        },
    },
    types::UserId,
};

/// Durable record of identities and their password hashes
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an identity (and its educator profile, if requested)
    async fn create_identity(&self, request: &UserCreateDBRequest) -> Result<Identity>;

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>>;

    async fn get_credential(&self, id: UserId) -> Result<Option<Credential>>;

    async fn get_credential_by_email(&self, email: &str) -> Result<Option<Credential>>;

    /// Returns false if no such identity exists
    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<bool>;

    /// Delete an identity; its educator profile and refresh session go with it.
    /// Returns false if no such identity exists.
    async fn delete_identity(&self, id: UserId) -> Result<bool>;
}

/// Durable, one-per-user refresh session storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Atomically insert or replace the session for `user_id`
    async fn upsert_session(&self, user_id: UserId, request: &RefreshSessionCreateDBRequest) -> Result<RefreshSession>;

    async fn get_session_by_secret_hash(&self, secret_hash: &str) -> Result<Option<RefreshSession>>;

    async fn delete_session_for_user(&self, user_id: UserId) -> Result<bool>;

    async fn delete_session_by_secret_hash(&self, secret_hash: &str) -> Result<bool>;
}

/// Everything the auth core needs from storage
#[async_trait]
pub trait AuthStore: CredentialStore + SessionStore {
    /// Create an identity and its first refresh session in one transaction. Either both rows
    /// exist afterwards or neither does.
    async fn create_identity_with_session(
        &self,
        request: &UserCreateDBRequest,
        session: &RefreshSessionCreateDBRequest,
    ) -> Result<(Identity, RefreshSession)>;
}
