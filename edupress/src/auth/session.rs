//! Session orchestration: signup, login, logout, refresh and account deletion.
//!
//! A session is an access token (stateless, short-lived) plus a refresh session (stored,
//! long-lived, one per user). Refreshing mints a new access token against the existing refresh
//! session without extending or rotating it; only a new login replaces the refresh secret.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::{
    api::models::users::{Identity, Role},
    auth::{
        password::{self, Argon2Params},
        refresh::RefreshSessionStore,
        token::TokenCodec,
    },
    config::PasswordConfig,
    db::{
        AuthStore,
        errors::DbError,
        models::users::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_NICK_NAME_LENGTH, UserCreateDBRequest},
    },
    errors::{Error, Result},
};

/// Validated-on-entry signup input
#[derive(Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub nick_name: Option<String>,
}

#[derive(Debug)]
pub struct SignupOutcome {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AuthStore>,
    tokens: TokenCodec,
    refresh: RefreshSessionStore,
    password: PasswordConfig,
}

/// Emails are compared case-insensitively by storing them trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash on a blocking thread to avoid stalling the runtime
pub async fn hash_password_blocking(password: String, params: Argon2Params) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password, params))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest { message: message.into() }
}

fn signup_conflict(err: DbError) -> Error {
    let message = match err.unique_constraint() {
        Some(c) if c.contains("email") => Some("An account with this email address already exists"),
        Some(c) if c.contains("nick_name") => Some("This nick name is already taken"),
        _ => None,
    };

    match message {
        Some(message) => Error::Conflict {
            message: message.to_string(),
        },
        None => Error::Database(err),
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn AuthStore>, tokens: TokenCodec, refresh: RefreshSessionStore, password: PasswordConfig) -> Self {
        Self {
            store,
            tokens,
            refresh,
            password,
        }
    }

    fn validate_signup(&self, signup: &Signup) -> Result<()> {
        let name = signup.name.trim();
        if name.is_empty() {
            return Err(bad_request("Name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(bad_request(format!("Name must be no more than {MAX_NAME_LENGTH} characters")));
        }

        let email = normalize_email(&signup.email);
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(bad_request("Email address is not valid")),
        }
        if email.chars().count() > MAX_EMAIL_LENGTH {
            return Err(bad_request(format!(
                "Email address must be no more than {MAX_EMAIL_LENGTH} characters"
            )));
        }

        let length = signup.password.chars().count();
        if length < self.password.min_length {
            return Err(bad_request(format!(
                "Password must be at least {} characters",
                self.password.min_length
            )));
        }
        if length > self.password.max_length {
            return Err(bad_request(format!(
                "Password must be no more than {} characters",
                self.password.max_length
            )));
        }

        if signup.role == Role::Educator && signup.nick_name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(bad_request("nick_name is required for educators"));
        }
        if signup
            .nick_name
            .as_deref()
            .is_some_and(|n| n.trim().chars().count() > MAX_NICK_NAME_LENGTH)
        {
            return Err(bad_request(format!(
                "nick_name must be no more than {MAX_NICK_NAME_LENGTH} characters"
            )));
        }

        Ok(())
    }

    /// Create an identity with its first refresh session and return both tokens.
    ///
    /// ADMIN identities cannot be created here.
    #[instrument(skip_all, fields(role = %signup.role), err)]
    pub async fn signup(&self, signup: Signup) -> Result<SignupOutcome> {
        if signup.role == Role::Admin {
            return Err(Error::RoleNotAllowed { role: signup.role });
        }
        self.validate_signup(&signup)?;

        let password_hash = hash_password_blocking(signup.password, self.password.argon2_params()).await?;
        let request = UserCreateDBRequest {
            name: signup.name.trim().to_string(),
            email: normalize_email(&signup.email),
            password_hash,
            role: signup.role,
            nick_name: signup.nick_name.map(|n| n.trim().to_string()),
        };

        let (issued, session) = self.refresh.mint();
        let (identity, _) = self
            .store
            .create_identity_with_session(&request, &session)
            .await
            .map_err(signup_conflict)?;

        let access_token = self.tokens.issue(&identity)?;
        info!(user_id = identity.id, "Account created");

        Ok(SignupOutcome {
            identity,
            access_token,
            refresh_token: issued.secret,
        })
    }

    /// Exchange credentials for a fresh token pair, replacing any existing refresh session
    #[instrument(skip_all, err)]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let Some(credential) = self.store.get_credential_by_email(&normalize_email(email)).await? else {
            debug!("Login for unknown email");
            return Err(Error::InvalidCredentials);
        };

        if !verify_password_blocking(password.to_string(), credential.password_hash).await? {
            debug!(user_id = credential.identity.id, "Login with wrong password");
            return Err(Error::InvalidCredentials);
        }

        let issued = self.refresh.issue_for(credential.identity.id).await?;
        let access_token = self.tokens.issue(&credential.identity)?;

        Ok(LoginOutcome {
            access_token,
            refresh_token: issued.secret,
        })
    }

    /// Revoke the session holding `refresh_secret`, if any. Unknown secrets are not an error.
    #[instrument(skip_all, err)]
    pub async fn logout(&self, refresh_secret: &str) -> Result<()> {
        let revoked = self.refresh.revoke_by_secret(refresh_secret).await?;
        debug!(revoked, "Logout");
        Ok(())
    }

    /// Mint a new access token from a live refresh session. The session itself is untouched.
    #[instrument(skip_all, err)]
    pub async fn refresh(&self, refresh_secret: &str) -> Result<String> {
        let session = self
            .refresh
            .find_by_secret(refresh_secret)
            .await?
            .ok_or(Error::InvalidRefreshToken)?;

        if session.is_expired_at(Utc::now()) {
            return Err(Error::RefreshTokenExpired);
        }

        let identity = self
            .store
            .get_identity(session.user_id)
            .await?
            .ok_or(Error::InvalidRefreshToken)?;

        self.tokens.issue(&identity)
    }

    /// Delete the caller's own account after re-checking their password
    #[instrument(skip_all, fields(user_id = identity.id), err)]
    pub async fn delete_account(&self, identity: &Identity, password: &str) -> Result<()> {
        let credential = self
            .store
            .get_credential(identity.id)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password_blocking(password.to_string(), credential.password_hash).await? {
            return Err(Error::InvalidCredentials);
        }

        if !self.store.delete_identity(identity.id).await? {
            return Err(Error::Database(DbError::NotFound));
        }
        info!(user_id = identity.id, "Account deleted");

        Ok(())
    }
}
