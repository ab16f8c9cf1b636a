//! Storage layer: error taxonomy, models, repositories, and the PostgreSQL [`AuthStore`].
//!
//! Without an external database URL the application runs against an [`embedded`] PostgreSQL
//! instance, so both deployments go through the same SQL.

pub mod embedded;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod store;

pub use postgres::PostgresStore;
pub use store::{AuthStore, CredentialStore, SessionStore};
