use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

use crate::types::{EducatorId, UserId};

/// Role of an identity. Immutable once the account exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Educator,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Educator => write!(f, "EDUCATOR"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EDUCATOR" => Ok(Role::Educator),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// Educator profile attached to an identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct EducatorProfile {
    pub id: EducatorId,
    pub nick_name: String,
}

/// An authenticated principal, as resolved from the credential store.
///
/// Never carries the password hash; see [`crate::db::models::users::Credential`] for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub educator: Option<EducatorProfile>,
}

impl Identity {
    pub fn educator_id(&self) -> Option<EducatorId> {
        self.educator.as_ref().map(|e| e.id)
    }
}

/// Public user summary returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educator: Option<EducatorProfile>,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
            educator: identity.educator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Educator).unwrap(), "\"EDUCATOR\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::from_str::<Role>("\"ADMIN\"").unwrap(), Role::Admin);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("EDUCATOR".parse::<Role>(), Ok(Role::Educator));
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("admin".parse::<Role>().is_err());
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_response_omits_missing_educator() {
        let response = UserResponse::from(Identity {
            id: 7,
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role: Role::Admin,
            educator: None,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["role"], "ADMIN");
        assert!(json.get("educator").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
