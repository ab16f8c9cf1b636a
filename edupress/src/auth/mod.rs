//! Authentication and authorization core.
//!
//! # Authentication
//!
//! Clients sign up or log in with email and password and receive two credentials:
//!
//! - an **access token**: a short-lived HS256 JWT sent as `Authorization: Bearer <token>`
//! - a **refresh token**: an opaque long-lived secret, exchanged at `/auth/refresh` for a new
//!   access token
//!
//! Only one refresh session exists per user; logging in again invalidates the previous one.
//!
//! # Authorization
//!
//! - **Roles**: `EDUCATOR` or `ADMIN`, fixed at account creation
//! - **Ownership**: educators may only modify resources they own
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated identity in handlers
//! - [`password`]: Argon2id hashing and refresh secret generation
//! - [`permissions`]: Role and ownership checks
//! - [`refresh`]: Refresh session lifecycle
//! - [`session`]: Signup, login, logout, refresh and account deletion
//! - [`token`]: Access token signing and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use edupress::auth::{current_user::CurrentUser, permissions};
//! use edupress::types::Operation;
//!
//! async fn admin_handler(CurrentUser(identity): CurrentUser) -> Result<String, Error> {
//!     permissions::require_admin(&identity, Operation::ReadAll, "users")?;
//!     Ok(format!("Hello, {}!", identity.name))
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod refresh;
pub mod session;
pub mod token;
