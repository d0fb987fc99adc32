//! Authorization decisions over an optionally resolved [`UserContext`].
//!
//! A missing context means "no access": every predicate answers `false` and
//! every `require_*` variant fails with [`AppError::Unauthorized`].

use meterline_core::{AppError, AppResult};
use meterline_domain::{BranchId, Permission, RoleKey, RoleLevel, UserContext};

/// Permission expression required by a privileged operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRequirement {
    /// One specific permission.
    Permission(Permission),
    /// At least one of the listed permissions.
    AnyOf(Vec<Permission>),
    /// Every listed permission.
    AllOf(Vec<Permission>),
    /// Role level at or above the given authority.
    RoleLevel(RoleLevel),
    /// Access to one branch of the organization.
    BranchAccess(BranchId),
    /// Authority to manage holders of one role.
    ManageRole(RoleKey),
}

impl PermissionRequirement {
    /// Returns whether `context` satisfies this requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, context: &UserContext) -> bool {
        match self {
            Self::Permission(permission) => context.has_permission(*permission),
            Self::AnyOf(permissions) => context.has_any_permission(permissions),
            Self::AllOf(permissions) => context.has_all_permissions(permissions),
            Self::RoleLevel(level) => context.has_role_level(*level),
            Self::BranchAccess(branch_id) => context.can_access_branch(*branch_id),
            Self::ManageRole(role) => context.can_manage_role(*role),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Permission(permission) => format!("permission '{permission}'"),
            Self::AnyOf(permissions) => format!("any of [{}]", join(permissions)),
            Self::AllOf(permissions) => format!("all of [{}]", join(permissions)),
            Self::RoleLevel(level) => format!("role level {} or higher", level.value()),
            Self::BranchAccess(branch_id) => format!("access to branch '{branch_id}'"),
            Self::ManageRole(role) => format!("authority over role '{role}'"),
        }
    }
}

fn join(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns whether `permission` is granted.
#[must_use]
pub fn has_permission(context: Option<&UserContext>, permission: Permission) -> bool {
    context.is_some_and(|context| context.has_permission(permission))
}

/// Returns whether at least one of `permissions` is granted.
#[must_use]
pub fn has_any_permission(context: Option<&UserContext>, permissions: &[Permission]) -> bool {
    context.is_some_and(|context| context.has_any_permission(permissions))
}

/// Returns whether every one of `permissions` is granted.
#[must_use]
pub fn has_all_permissions(context: Option<&UserContext>, permissions: &[Permission]) -> bool {
    context.is_some_and(|context| context.has_all_permissions(permissions))
}

/// Returns whether the role level is `required` or numerically lower.
#[must_use]
pub fn has_role_level(context: Option<&UserContext>, required: RoleLevel) -> bool {
    context.is_some_and(|context| context.has_role_level(required))
}

/// Returns whether the principal may act on `branch_id`.
#[must_use]
pub fn can_access_branch(context: Option<&UserContext>, branch_id: BranchId) -> bool {
    context.is_some_and(|context| context.can_access_branch(branch_id))
}

/// Returns whether the principal may manage holders of `target`.
#[must_use]
pub fn can_manage_role(context: Option<&UserContext>, target: RoleKey) -> bool {
    context.is_some_and(|context| context.can_manage_role(target))
}

/// Returns the context when it satisfies `requirement`.
pub fn require<'a>(
    context: Option<&'a UserContext>,
    requirement: &PermissionRequirement,
) -> AppResult<&'a UserContext> {
    match context {
        Some(context) if requirement.is_satisfied_by(context) => Ok(context),
        context => Err(denial(context, requirement)),
    }
}

/// Builds the failure reported when `context` does not satisfy `requirement`.
pub(crate) fn denial(
    context: Option<&UserContext>,
    requirement: &PermissionRequirement,
) -> AppError {
    match context {
        None => AppError::Unauthorized("no active organization membership".to_owned()),
        Some(context) => AppError::Forbidden(format!(
            "principal '{}' lacks {} in organization '{}'",
            context.principal_id(),
            requirement.describe(),
            context.organization_id()
        )),
    }
}

/// Fails unless `permission` is granted.
pub fn require_permission(
    context: Option<&UserContext>,
    permission: Permission,
) -> AppResult<&UserContext> {
    require(context, &PermissionRequirement::Permission(permission))
}

/// Fails unless at least one of `permissions` is granted.
pub fn require_any_permission<'a>(
    context: Option<&'a UserContext>,
    permissions: &[Permission],
) -> AppResult<&'a UserContext> {
    require(context, &PermissionRequirement::AnyOf(permissions.to_vec()))
}

/// Fails unless every one of `permissions` is granted.
pub fn require_all_permissions<'a>(
    context: Option<&'a UserContext>,
    permissions: &[Permission],
) -> AppResult<&'a UserContext> {
    require(context, &PermissionRequirement::AllOf(permissions.to_vec()))
}

/// Fails unless the role level is `required` or numerically lower.
pub fn require_role_level(
    context: Option<&UserContext>,
    required: RoleLevel,
) -> AppResult<&UserContext> {
    require(context, &PermissionRequirement::RoleLevel(required))
}

/// Fails unless the principal may act on `branch_id`.
pub fn require_branch_access(
    context: Option<&UserContext>,
    branch_id: BranchId,
) -> AppResult<&UserContext> {
    require(context, &PermissionRequirement::BranchAccess(branch_id))
}
