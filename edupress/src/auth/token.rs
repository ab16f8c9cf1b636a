//! Access token issuance and verification.
//!
//! Access tokens are HS256 JWTs carrying `{sub, email, role, exp, type: "access"}`. They are not
//! stored anywhere: validity is signature, algorithm and expiry at verification time. Verification
//! is pinned to HS256 and uses zero leeway.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    api::models::users::{Identity, Role},
    errors::Error,
    types::UserId,
};

/// Token kind claim. Only access tokens are ever issued as JWTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "access")]
    Access,
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// Why a token failed verification. Logged, never shown to clients.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token could not be parsed")]
    Malformed,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token was not signed with HS256")]
    UnexpectedAlgorithm,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => TokenError::UnexpectedAlgorithm,
            // Bad base64, bad JSON, missing claims, wrong `type`
            _ => TokenError::Malformed,
        }
    }
}

/// Signs and verifies access tokens with a secret injected at construction.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("access_lifetime", &self.access_lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, access_lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_lifetime,
        }
    }

    /// Mint an access token for `identity`, expiring `access_lifetime` from now
    pub fn issue(&self, identity: &Identity) -> Result<String, Error> {
        let claims = AccessClaims {
            sub: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            exp: (Utc::now() + self.access_lifetime).timestamp(),
            kind: TokenKind::Access,
        };

        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &AccessClaims) -> Result<String, Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Check signature, algorithm and expiry, and decode the claims
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}
