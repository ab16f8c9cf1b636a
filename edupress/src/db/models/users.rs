//! Database models for identities and educator profiles.

use std::fmt;

use crate::{
    api::models::users::{EducatorProfile, Identity, Role},
    types::{EducatorId, UserId},
};

/// Column widths of `users.name`, `users.email` and `educators.nick_name`, in characters
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MAX_NICK_NAME_LENGTH: usize = 255;

/// Database request for creating a new identity
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// When set, an educator profile with this nick name is created alongside the user
    pub nick_name: Option<String>,
}

/// Row shape of `users LEFT JOIN educators`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub educator_id: Option<EducatorId>,
    pub nick_name: Option<String>,
}

/// An identity together with its stored password hash
#[derive(Clone)]
pub struct Credential {
    pub identity: Identity,
    pub password_hash: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

impl From<UserDBResponse> for Credential {
    fn from(row: UserDBResponse) -> Self {
        let educator = match (row.educator_id, row.nick_name) {
            (Some(id), Some(nick_name)) => Some(EducatorProfile { id, nick_name }),
            _ => None,
        };

        Self {
            identity: Identity {
                id: row.id,
                name: row.name,
                email: row.email,
                role: row.role,
                educator,
            },
            password_hash: row.password_hash,
        }
    }
}
