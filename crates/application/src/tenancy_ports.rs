mod audit;
mod mutations;
mod repositories;

pub use audit::{RoleChangeAudit, RoleChangeAuditEntry, RoleChangeQuery};
pub use mutations::{GuardedMutation, LastHolderGuard, MemberRecord, MemberRemoval, RoleUpdate};
pub use repositories::{
    MembershipRepository, OrganizationRepository, ProfileRepository, RoleChangeAuditRepository,
    RoleChangeLogRepository, RoleRepository,
};
