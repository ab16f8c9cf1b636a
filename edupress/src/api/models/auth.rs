use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::UserResponse;

// Request fields are optional so that a missing field is a 400 with a readable message rather
// than a JSON extractor rejection.

/// Request to create an educator account
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `EDUCATOR` (default). `ADMIN` is rejected.
    pub role: Option<String>,
    /// Required for educators
    pub nick_name: Option<String>,
}

/// Login with email and password
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body for logout and refresh
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// Re-authentication for account deletion
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteAccountRequest {
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignupResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub new_access_token: String,
}

/// Body of every error response, and of logout
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}
