//! Projections of educator-owned content.
//!
//! Publications and commentaries are managed elsewhere; the auth core only needs to know who owns
//! them.

use crate::types::{CommentaryId, EducatorId, PublicationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub id: PublicationId,
    pub educator_id: EducatorId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commentary {
    pub id: CommentaryId,
    pub educator_id: EducatorId,
    pub publication_id: PublicationId,
}
