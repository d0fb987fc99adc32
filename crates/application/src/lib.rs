//! Application services and ports.

#![forbid(unsafe_code)]

pub mod authorization_guard;

mod authorization_service;
mod context_resolver;
mod membership_service;
mod onboarding_service;
mod tenancy_ports;

#[cfg(test)]
mod test_support;

pub use authorization_guard::PermissionRequirement;
pub use authorization_service::AuthorizationService;
pub use context_resolver::ContextResolver;
pub use membership_service::{
    MemberRemovalOutcome, MembershipError, MembershipService, OrganizationMember,
    RoleChangeOutcome,
};
pub use onboarding_service::{CompletenessReport, MissingField, OnboardingService};
pub use tenancy_ports::{
    GuardedMutation, LastHolderGuard, MemberRecord, MemberRemoval, MembershipRepository,
    OrganizationRepository, ProfileRepository, RoleChangeAudit, RoleChangeAuditEntry,
    RoleChangeAuditRepository, RoleChangeLogRepository, RoleChangeQuery, RoleRepository,
    RoleUpdate,
};
