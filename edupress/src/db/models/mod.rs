//! Storage-layer data models.

pub mod content;
pub mod refresh_sessions;
pub mod users;
