use std::collections::BTreeSet;

use meterline_core::{OrganizationId, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::{BranchId, Permission, Role, RoleKey, RoleLevel};

/// Resolved organization context of one principal at one point in time.
///
/// Contexts are recomputed per request and never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    principal_id: PrincipalId,
    organization_id: OrganizationId,
    branch_id: BranchId,
    role: Role,
    permissions: BTreeSet<Permission>,
}

impl UserContext {
    /// Assembles a context from a validated membership, role and grant set.
    #[must_use]
    pub fn new(
        principal_id: PrincipalId,
        organization_id: OrganizationId,
        branch_id: BranchId,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            principal_id,
            organization_id,
            branch_id,
            role,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns the principal the context was resolved for.
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// Returns the active organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the assigned branch.
    #[must_use]
    pub fn branch_id(&self) -> BranchId {
        self.branch_id
    }

    /// Returns the resolved role.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Returns the effective permission set.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Returns whether `permission` is granted.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns whether at least one of `permissions` is granted.
    #[must_use]
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions
            .iter()
            .any(|permission| self.has_permission(*permission))
    }

    /// Returns whether every one of `permissions` is granted.
    #[must_use]
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions
            .iter()
            .all(|permission| self.has_permission(*permission))
    }

    /// Returns whether the role level is `required` or numerically lower.
    #[must_use]
    pub fn has_role_level(&self, required: RoleLevel) -> bool {
        self.role.level().satisfies(required)
    }

    /// Returns whether the principal may act on `branch_id`.
    ///
    /// The top-authority role reaches every branch of its organization; every
    /// other role reaches only its assigned branch.
    #[must_use]
    pub fn can_access_branch(&self, branch_id: BranchId) -> bool {
        self.role.key().is_top_authority() || self.branch_id == branch_id
    }

    /// Returns whether the principal may manage holders of `target`.
    #[must_use]
    pub fn can_manage_role(&self, target: RoleKey) -> bool {
        self.role.key().can_manage(target)
    }
}

#[cfg(test)]
mod tests {
    use meterline_core::{OrganizationId, PrincipalId};
    use proptest::prelude::*;

    use crate::{BranchId, Permission, Role, RoleId, RoleKey, RoleLevel};

    use super::UserContext;

    fn context(key: RoleKey, level: u8, permissions: Vec<Permission>) -> UserContext {
        let role = match RoleLevel::new(level) {
            Ok(level) => Role::new(RoleId::new(), key, key.as_str(), level),
            Err(error) => panic!("invalid test level: {error}"),
        };
        UserContext::new(
            PrincipalId::new(),
            OrganizationId::new(),
            BranchId::new(),
            role,
            permissions,
        )
    }

    fn level(value: u8) -> RoleLevel {
        match RoleLevel::new(value) {
            Ok(level) => level,
            Err(error) => panic!("invalid test level: {error}"),
        }
    }

    #[test]
    fn executive_reaches_any_branch() {
        let context = context(RoleKey::Executive, 1, Vec::new());
        assert!(context.can_access_branch(BranchId::new()));
        assert!(context.can_access_branch(context.branch_id()));
    }

    #[test]
    fn branch_roles_reach_only_their_branch() {
        let context = context(RoleKey::BranchManager, 2, Vec::new());
        assert!(context.can_access_branch(context.branch_id()));
        assert!(!context.can_access_branch(BranchId::new()));
    }

    #[test]
    fn role_level_check_uses_lower_or_equal() {
        let context = context(RoleKey::BranchManager, 2, Vec::new());
        assert!(context.has_role_level(level(2)));
        assert!(context.has_role_level(level(3)));
        assert!(!context.has_role_level(level(1)));
    }

    #[test]
    fn any_of_empty_list_is_false() {
        let context = context(RoleKey::Executive, 1, Permission::all().to_vec());
        assert!(!context.has_any_permission(&[]));
        assert!(context.has_all_permissions(&[]));
    }

    fn permission_subset() -> impl Strategy<Value = Vec<Permission>> {
        proptest::sample::subsequence(Permission::all().to_vec(), 0..=Permission::all().len())
    }

    proptest! {
        #[test]
        fn granted_set_satisfies_all_of_itself(granted in permission_subset()) {
            let context = context(RoleKey::GridAdministrator, 3, granted.clone());
            prop_assert!(context.has_all_permissions(&granted));

            let missing = Permission::all()
                .iter()
                .copied()
                .find(|permission| !granted.contains(permission));
            if let Some(missing) = missing {
                let mut extended = granted.clone();
                extended.push(missing);
                prop_assert!(!context.has_all_permissions(&extended));
                prop_assert!(!context.has_permission(missing));
            }
        }

        #[test]
        fn any_of_is_true_iff_intersection_is_non_empty(
            granted in permission_subset(),
            requested in permission_subset(),
        ) {
            let context = context(RoleKey::BranchManager, 2, granted.clone());
            let intersects = requested.iter().any(|permission| granted.contains(permission));
            prop_assert_eq!(context.has_any_permission(&requested), intersects);
        }
    }
}
