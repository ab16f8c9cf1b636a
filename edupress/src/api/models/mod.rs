//! API request and response data models.
//!
//! API models are distinct from database models; password hashes and refresh secret digests
//! never appear here.
//!
//! - [`auth`]: Signup, login, logout and refresh payloads
//! - [`users`]: Roles, identities and the public user summary

pub mod auth;
pub mod users;
