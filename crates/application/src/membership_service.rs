use std::sync::Arc;

use chrono::{DateTime, Utc};
use meterline_core::{AppError, OrganizationId, PrincipalId, PrincipalIdentity};
use meterline_domain::{BranchId, Permission, Role, UserContext};

use crate::AuthorizationService;
use crate::authorization_guard::PermissionRequirement;
use crate::tenancy_ports::{
    MembershipRepository, RoleChangeAuditRepository, RoleChangeLogRepository, RoleRepository,
};

mod errors;
mod locks;
mod queries;
mod removal;
mod role_change;

pub use errors::MembershipError;

use locks::OrganizationLocks;

/// Result of a role-change request that passed every precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChangeOutcome {
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Member whose role was requested to change.
    pub target_principal_id: PrincipalId,
    /// Role held before the request.
    pub from_role: Role,
    /// Role held after the request.
    pub to_role: Role,
    /// False when the member already held the requested role.
    pub changed: bool,
    /// Whether the audit row was written.
    pub audit_recorded: bool,
}

/// Result of a successful member removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRemovalOutcome {
    /// Organization the removal was requested from.
    pub organization_id: OrganizationId,
    /// Principal whose profile was soft-deleted.
    pub removed_principal_id: PrincipalId,
}

/// Organization member projection for administrative views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationMember {
    /// Member principal.
    pub principal_id: PrincipalId,
    /// Profile email.
    pub email: String,
    /// Profile full name.
    pub full_name: Option<String>,
    /// Assigned branch.
    pub branch_id: Option<BranchId>,
    /// Assigned role.
    pub role: Role,
    /// Membership creation timestamp.
    pub joined_at: DateTime<Utc>,
}

/// Application service for the role-change and member-removal workflows.
#[derive(Clone)]
pub struct MembershipService {
    authorization: AuthorizationService,
    roles: Arc<dyn RoleRepository>,
    memberships: Arc<dyn MembershipRepository>,
    audit_repository: Arc<dyn RoleChangeAuditRepository>,
    audit_log_repository: Arc<dyn RoleChangeLogRepository>,
    locks: OrganizationLocks,
}

impl MembershipService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization: AuthorizationService,
        roles: Arc<dyn RoleRepository>,
        memberships: Arc<dyn MembershipRepository>,
        audit_repository: Arc<dyn RoleChangeAuditRepository>,
        audit_log_repository: Arc<dyn RoleChangeLogRepository>,
    ) -> Self {
        Self {
            authorization,
            roles,
            memberships,
            audit_repository,
            audit_log_repository,
            locks: OrganizationLocks::default(),
        }
    }

    async fn resolve_actor(
        &self,
        actor: &PrincipalIdentity,
        operation: &'static str,
    ) -> Result<UserContext, MembershipError> {
        match self.authorization.resolve_context(actor.principal_id()).await {
            Ok(Some(context)) => Ok(context),
            Ok(None) => Err(MembershipError::NotAuthenticated),
            Err(fault) => Err(MembershipError::unexpected(operation, &fault)),
        }
    }
}

fn authorization_error(operation: &'static str, error: AppError) -> MembershipError {
    match error {
        AppError::Unauthorized(_) => MembershipError::NotAuthenticated,
        AppError::Forbidden(_) => MembershipError::InsufficientPermissions,
        fault => MembershipError::unexpected(operation, &fault),
    }
}

fn require_role_management(context: &UserContext) -> Result<(), MembershipError> {
    if context.has_any_permission(Permission::role_management()) {
        Ok(())
    } else {
        Err(MembershipError::InsufficientPermissions)
    }
}
