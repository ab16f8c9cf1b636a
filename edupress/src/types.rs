//! Common type definitions shared across the crate.
//!
//! # ID Types
//!
//! Entity IDs are `BIGSERIAL` keys wrapped in type aliases:
//!
//! - [`UserId`]: Identity (credential record) identifier
//! - [`EducatorId`]: Educator profile identifier
//! - [`PublicationId`]: Publication identifier
//! - [`CommentaryId`]: Commentary identifier
//!
//! # Operations
//!
//! [`Operation`] names the action a request attempted, and is carried by permission errors so
//! that log lines say what was refused. *-All means access to every user's resources.

use std::fmt;

// Type aliases for IDs
pub type UserId = i64;
pub type EducatorId = i64;
pub type PublicationId = i64;
pub type CommentaryId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadAll,
    DeleteAll,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ReadAll => write!(f, "read"),
            Operation::DeleteAll => write!(f, "delete"),
        }
    }
}
