use meterline_core::{OrganizationId, PrincipalId};
use meterline_domain::{Membership, RoleId};

/// Guard evaluated by the store in the same transaction as the mutation.
///
/// When the target currently holds `role_id` and the mutation would take it
/// away, at least one other active holder must remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastHolderGuard {
    /// Protected role.
    pub role_id: RoleId,
}

/// Outcome of a guarded store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedMutation<T> {
    /// The mutation committed.
    Applied(T),
    /// The guard refused the mutation and nothing changed.
    LastHolderBlocked,
}

/// Role reassignment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleUpdate {
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Member whose role changes.
    pub principal_id: PrincipalId,
    /// New role.
    pub role_id: RoleId,
    /// Optional last-holder guard.
    pub guard: Option<LastHolderGuard>,
}

/// Member removal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRemoval {
    /// Organization the removal was requested from.
    pub organization_id: OrganizationId,
    /// Member being removed.
    pub principal_id: PrincipalId,
    /// Actor recorded on the soft-deleted profile.
    pub removed_by: PrincipalId,
    /// Optional last-holder guard, checked in every organization where the
    /// member actively holds the protected role.
    pub guard: Option<LastHolderGuard>,
}

/// Active membership joined with profile details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    /// Membership row.
    pub membership: Membership,
    /// Profile email.
    pub email: String,
    /// Profile full name.
    pub full_name: Option<String>,
}
