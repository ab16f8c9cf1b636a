//! Role and ownership checks.
//!
//! Two rules gate every non-public route once the caller is authenticated:
//!
//! - **Role**: admin-only operations require [`Role::Admin`]; failure is 403.
//! - **Ownership**: educator-owned resources may only be touched by the owning educator. Failure
//!   is reported as 404, so a non-owner cannot tell a foreign resource from a missing one.

use crate::{
    api::models::users::{Identity, Role},
    db::models::content::{Commentary, Publication},
    errors::{Error, Result},
    types::{EducatorId, Operation},
};

/// A resource owned by exactly one educator
pub trait OwnedByEducator {
    /// Resource name used in error messages, e.g. "Publication"
    const RESOURCE: &'static str;

    fn resource_id(&self) -> i64;

    fn owner_educator_id(&self) -> EducatorId;
}

impl OwnedByEducator for Publication {
    const RESOURCE: &'static str = "Publication";

    fn resource_id(&self) -> i64 {
        self.id
    }

    fn owner_educator_id(&self) -> EducatorId {
        self.educator_id
    }
}

impl OwnedByEducator for Commentary {
    const RESOURCE: &'static str = "Commentary";

    fn resource_id(&self) -> i64 {
        self.id
    }

    fn owner_educator_id(&self) -> EducatorId {
        self.educator_id
    }
}

pub fn is_admin(identity: &Identity) -> bool {
    identity.role == Role::Admin
}

/// Fail with 403 unless `identity` is an admin
pub fn require_admin(identity: &Identity, action: Operation, resource: &str) -> Result<()> {
    if is_admin(identity) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Role::Admin,
            action,
            resource: resource.to_string(),
        })
    }
}

/// Identities without an educator profile own nothing
pub fn owns_resource<R: OwnedByEducator>(identity: &Identity, resource: &R) -> bool {
    identity.educator_id() == Some(resource.owner_educator_id())
}

/// Fail with 404 unless `identity` owns `resource`
pub fn require_owner<R: OwnedByEducator>(identity: &Identity, resource: &R) -> Result<()> {
    if owns_resource(identity, resource) {
        Ok(())
    } else {
        Err(Error::NotFound {
            resource: R::RESOURCE.to_string(),
            id: resource.resource_id().to_string(),
        })
    }
}
