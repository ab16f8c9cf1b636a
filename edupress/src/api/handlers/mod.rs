//! HTTP request handlers.
//!
//! - [`auth`]: Signup, login, logout and access token refresh
//! - [`users`]: The caller's own account, and admin user management

pub mod auth;
pub mod users;
