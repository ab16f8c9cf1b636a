use crate::api::models::users::Role;
use crate::db::errors::DbError;
use crate::types::Operation;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Challenge sent with every 401 response
pub const WWW_AUTHENTICATE_CHALLENGE: &str = r#"Bearer realm="api""#;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or the access token was rejected
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Bearer header present but syntactically invalid
    #[error("Malformed Authorization header")]
    MalformedHeader,

    /// Login or re-authentication failed. One message for unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh secret does not match any session
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh session exists but has expired
    #[error("Refresh token expired")]
    RefreshTokenExpired,

    /// Identity is known but lacks the required role
    #[error("Insufficient permissions to {action} {resource} (requires {required})")]
    InsufficientPermissions {
        required: Role,
        action: Operation,
        resource: String,
    },

    /// Self-service signup asked for a role it may not grant
    #[error("Signup with role {role} is not allowed")]
    RoleNotAllowed { role: Role },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found (or not visible to the caller)
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Unique data already taken, e.g. a registered email
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. }
            | Error::MalformedHeader
            | Error::InvalidCredentials
            | Error::InvalidRefreshToken
            | Error::RefreshTokenExpired => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::RoleNotAllowed { .. } | Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message
                .clone()
                .unwrap_or_else(|| "Authentication credentials were not provided".to_string()),
            Error::MalformedHeader => "Invalid Authorization header".to_string(),
            Error::InvalidCredentials => "Invalid email or password".to_string(),
            Error::InvalidRefreshToken => "Invalid refresh token".to_string(),
            Error::RefreshTokenExpired => "Refresh token expired".to_string(),
            Error::InsufficientPermissions { action, resource, .. } => {
                format!("You do not have permission to {action} {resource}")
            }
            Error::RoleNotAllowed { role } => format!("Cannot sign up with the {role} role"),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} does not exist or isn't yours")
            }
            Error::Conflict { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some(c) if c.contains("email") => "An account with this email address already exists".to_string(),
                    Some(c) if c.contains("nick_name") => "This nick name is already taken".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log level follows severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } => {
                tracing::warn!("Constraint error: {}", self);
            }
            Error::Unauthenticated { .. }
            | Error::MalformedHeader
            | Error::InvalidCredentials
            | Error::InvalidRefreshToken
            | Error::RefreshTokenExpired
            | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::RoleNotAllowed { .. } | Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = Json(json!({ "detail": self.user_message() }));
        let mut response = (status, body).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_CHALLENGE),
            );
        }

        response
    }
}

/// Unreadable request bodies surface as 400 with axum's explanation as the detail
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
