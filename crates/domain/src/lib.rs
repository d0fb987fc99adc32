//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod context;
mod membership;
mod organization;
mod permission;
mod profile;
mod role;

pub use context::UserContext;
pub use membership::{Membership, MembershipStatus};
pub use organization::{Branch, BranchId, Organization};
pub use permission::Permission;
pub use profile::Profile;
pub use role::{Role, RoleId, RoleKey, RoleLevel};
