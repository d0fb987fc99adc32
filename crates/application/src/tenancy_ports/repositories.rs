use async_trait::async_trait;

use meterline_core::{AppResult, OrganizationId, PrincipalId};
use meterline_domain::{
    Branch, BranchId, Membership, Organization, Permission, Profile, Role, RoleId, RoleKey,
};

use super::audit::{RoleChangeAudit, RoleChangeAuditEntry, RoleChangeQuery};
use super::mutations::{GuardedMutation, MemberRecord, MemberRemoval, RoleUpdate};

/// Read-only port over the role registry and its grants.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists every configured role ordered by level.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Finds a role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by its stable key.
    async fn find_role_by_key(&self, key: RoleKey) -> AppResult<Option<Role>>;

    /// Lists permissions granted to a role.
    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;
}

/// Port over organization memberships.
///
/// "Active" always means membership status `active` and a profile that has
/// not been soft-deleted.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Lists every active membership held by a principal.
    async fn list_active_memberships_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<Membership>>;

    /// Finds the active membership of a principal in one organization.
    async fn find_active_membership(
        &self,
        organization_id: OrganizationId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Membership>>;

    /// Lists active members of an organization with profile details.
    async fn list_active_members(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<MemberRecord>>;

    /// Counts active members of an organization holding `role_id`.
    async fn count_active_role_holders(
        &self,
        organization_id: OrganizationId,
        role_id: RoleId,
    ) -> AppResult<u64>;

    /// Reassigns a member's role, honouring the optional last-holder guard atomically.
    async fn update_member_role(
        &self,
        input: RoleUpdate,
    ) -> AppResult<GuardedMutation<Membership>>;

    /// Soft-deletes the member's profile, honouring the optional last-holder guard atomically.
    async fn soft_delete_member(&self, input: MemberRemoval) -> AppResult<GuardedMutation<()>>;
}

/// Port over principal profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a profile, including soft-deleted ones.
    async fn find_profile(&self, principal_id: PrincipalId) -> AppResult<Option<Profile>>;
}

/// Port over organizations and their branches.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Finds an organization.
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>>;

    /// Finds a branch regardless of owning organization.
    async fn find_branch(&self, branch_id: BranchId) -> AppResult<Option<Branch>>;
}

/// Port for persisting append-only role-change audit rows.
#[async_trait]
pub trait RoleChangeAuditRepository: Send + Sync {
    /// Persists one audit row.
    async fn append_role_change(&self, audit: RoleChangeAudit) -> AppResult<()>;
}

/// Port for reading the role-change audit trail.
#[async_trait]
pub trait RoleChangeLogRepository: Send + Sync {
    /// Lists most recent role changes of an organization.
    async fn list_role_changes(
        &self,
        organization_id: OrganizationId,
        query: RoleChangeQuery,
    ) -> AppResult<Vec<RoleChangeAuditEntry>>;
}
