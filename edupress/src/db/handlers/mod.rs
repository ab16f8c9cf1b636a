//! PostgreSQL repositories, one per table group.
//!
//! Repositories borrow a `&mut PgConnection`, so the same code runs against a pooled connection
//! or inside a transaction.

pub mod refresh_sessions;
pub mod users;

pub use refresh_sessions::RefreshSessions;
pub use users::Users;
