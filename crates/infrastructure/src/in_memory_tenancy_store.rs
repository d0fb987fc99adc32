use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use meterline_application::{
    GuardedMutation, LastHolderGuard, MemberRecord, MemberRemoval, MembershipRepository,
    OrganizationRepository, ProfileRepository, RoleChangeAudit, RoleChangeAuditEntry,
    RoleChangeAuditRepository, RoleChangeLogRepository, RoleChangeQuery, RoleRepository,
    RoleUpdate,
};
use meterline_core::{AppError, AppResult, OrganizationId, PrincipalId};
use meterline_domain::{
    Branch, BranchId, Membership, Organization, Permission, Profile, Role, RoleId, RoleKey,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct TenancyState {
    roles: HashMap<RoleId, Role>,
    grants: HashMap<RoleId, Vec<Permission>>,
    organizations: HashMap<OrganizationId, Organization>,
    branches: HashMap<BranchId, Branch>,
    profiles: HashMap<PrincipalId, Profile>,
    memberships: Vec<Membership>,
    audit: Vec<(String, RoleChangeAudit)>,
}

impl TenancyState {
    fn is_active(&self, membership: &Membership) -> bool {
        membership.is_active()
            && self
                .profiles
                .get(&membership.principal_id)
                .is_some_and(|profile| !profile.is_deleted())
    }

    fn active_index(
        &self,
        organization_id: OrganizationId,
        principal_id: PrincipalId,
    ) -> Option<usize> {
        self.memberships.iter().position(|membership| {
            membership.organization_id == organization_id
                && membership.principal_id == principal_id
                && self.is_active(membership)
        })
    }

    fn active_holders(&self, organization_id: OrganizationId, role_id: RoleId) -> usize {
        self.memberships
            .iter()
            .filter(|membership| {
                membership.organization_id == organization_id
                    && membership.role_id == role_id
                    && self.is_active(membership)
            })
            .count()
    }

    fn blocks(&self, target: &Membership, guard: Option<LastHolderGuard>) -> bool {
        guard.is_some_and(|guard| {
            target.role_id == guard.role_id
                && self.active_holders(target.organization_id, guard.role_id) <= 1
        })
    }

    fn blocks_removal(&self, principal_id: PrincipalId, guard: Option<LastHolderGuard>) -> bool {
        self.memberships.iter().any(|membership| {
            membership.principal_id == principal_id
                && self.is_active(membership)
                && self.blocks(membership, guard)
        })
    }
}

/// In-memory implementation of every tenancy port.
///
/// Each guarded mutation evaluates its guard and applies the change under one
/// write lock. Intended for tests and local runs without PostgreSQL.
#[derive(Debug)]
pub struct InMemoryTenancyStore {
    state: RwLock<TenancyState>,
}

impl Default for InMemoryTenancyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTenancyStore {
    /// Creates a store seeded with the default role catalog.
    #[must_use]
    pub fn new() -> Self {
        let mut state = TenancyState::default();
        for key in RoleKey::all() {
            let role = Role::new(
                RoleId::new(),
                *key,
                key.default_display_name(),
                key.default_level(),
            );
            state.grants.insert(role.id(), key.default_grants().to_vec());
            state.roles.insert(role.id(), role);
        }

        Self {
            state: RwLock::new(state),
        }
    }

    /// Stores or replaces an organization.
    pub async fn insert_organization(&self, organization: Organization) {
        self.state
            .write()
            .await
            .organizations
            .insert(organization.id, organization);
    }

    /// Stores or replaces a branch.
    pub async fn insert_branch(&self, branch: Branch) {
        self.state.write().await.branches.insert(branch.id, branch);
    }

    /// Stores or replaces a profile.
    pub async fn insert_profile(&self, profile: Profile) {
        self.state
            .write()
            .await
            .profiles
            .insert(profile.principal_id, profile);
    }

    /// Stores a membership, rejecting a second active membership for the
    /// same principal and organization.
    pub async fn insert_membership(&self, membership: Membership) -> AppResult<()> {
        let mut state = self.state.write().await;
        if membership.is_active()
            && state.memberships.iter().any(|existing| {
                existing.is_active()
                    && existing.principal_id == membership.principal_id
                    && existing.organization_id == membership.organization_id
            })
        {
            return Err(AppError::Conflict(format!(
                "principal '{}' already holds an active membership in organization '{}'",
                membership.principal_id, membership.organization_id
            )));
        }

        state.memberships.push(membership);
        Ok(())
    }

    /// Replaces the permissions granted to a role.
    pub async fn set_role_grants(&self, role_id: RoleId, grants: Vec<Permission>) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        }

        state.grants.insert(role_id, grants);
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryTenancyStore {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.state.read().await.roles.values().cloned().collect();
        roles.sort_by_key(|role| (role.level(), role.key().as_str()));
        Ok(roles)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_key(&self, key: RoleKey) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .values()
            .find(|role| role.key() == key)
            .cloned())
    }

    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .get(&role_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryTenancyStore {
    async fn list_active_memberships_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|membership| {
                membership.principal_id == principal_id && state.is_active(membership)
            })
            .cloned()
            .collect())
    }

    async fn find_active_membership(
        &self,
        organization_id: OrganizationId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .active_index(organization_id, principal_id)
            .and_then(|index| state.memberships.get(index).cloned()))
    }

    async fn list_active_members(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<MemberRecord>> {
        let state = self.state.read().await;
        let mut members: Vec<MemberRecord> = state
            .memberships
            .iter()
            .filter(|membership| {
                membership.organization_id == organization_id && state.is_active(membership)
            })
            .filter_map(|membership| {
                state
                    .profiles
                    .get(&membership.principal_id)
                    .map(|profile| MemberRecord {
                        membership: membership.clone(),
                        email: profile.email.clone(),
                        full_name: profile.full_name.clone(),
                    })
            })
            .collect();
        members.sort_by(|left, right| left.email.cmp(&right.email));

        Ok(members)
    }

    async fn count_active_role_holders(
        &self,
        organization_id: OrganizationId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        let holders = self
            .state
            .read()
            .await
            .active_holders(organization_id, role_id);
        Ok(holders as u64)
    }

    async fn update_member_role(
        &self,
        input: RoleUpdate,
    ) -> AppResult<GuardedMutation<Membership>> {
        let mut state = self.state.write().await;
        let index = state
            .active_index(input.organization_id, input.principal_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "principal '{}' has no active membership in organization '{}'",
                    input.principal_id, input.organization_id
                ))
            })?;

        let target = &state.memberships[index];
        let loses_role = input
            .guard
            .is_some_and(|guard| input.role_id != guard.role_id);
        if loses_role && state.blocks(target, input.guard) {
            return Ok(GuardedMutation::LastHolderBlocked);
        }

        let now = Utc::now();
        let membership = &mut state.memberships[index];
        membership.role_id = input.role_id;
        membership.updated_at = now;
        let updated = membership.clone();

        if let Some(profile) = state.profiles.get_mut(&input.principal_id)
            && profile.organization_id == Some(input.organization_id)
        {
            profile.role_id = Some(input.role_id);
        }

        Ok(GuardedMutation::Applied(updated))
    }

    async fn soft_delete_member(&self, input: MemberRemoval) -> AppResult<GuardedMutation<()>> {
        let mut state = self.state.write().await;
        if state
            .active_index(input.organization_id, input.principal_id)
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "principal '{}' has no active membership in organization '{}'",
                input.principal_id, input.organization_id
            )));
        }

        if state.blocks_removal(input.principal_id, input.guard) {
            return Ok(GuardedMutation::LastHolderBlocked);
        }

        let profile = state
            .profiles
            .get_mut(&input.principal_id)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "active membership of '{}' has no profile",
                    input.principal_id
                ))
            })?;
        profile.deleted_at = Some(Utc::now());
        profile.deleted_by = Some(input.removed_by);

        Ok(GuardedMutation::Applied(()))
    }
}

#[async_trait]
impl ProfileRepository for InMemoryTenancyStore {
    async fn find_profile(&self, principal_id: PrincipalId) -> AppResult<Option<Profile>> {
        Ok(self.state.read().await.profiles.get(&principal_id).cloned())
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryTenancyStore {
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>> {
        Ok(self
            .state
            .read()
            .await
            .organizations
            .get(&organization_id)
            .cloned())
    }

    async fn find_branch(&self, branch_id: BranchId) -> AppResult<Option<Branch>> {
        Ok(self.state.read().await.branches.get(&branch_id).cloned())
    }
}

#[async_trait]
impl RoleChangeAuditRepository for InMemoryTenancyStore {
    async fn append_role_change(&self, audit: RoleChangeAudit) -> AppResult<()> {
        self.state
            .write()
            .await
            .audit
            .push((Uuid::new_v4().to_string(), audit));
        Ok(())
    }
}

#[async_trait]
impl RoleChangeLogRepository for InMemoryTenancyStore {
    async fn list_role_changes(
        &self,
        organization_id: OrganizationId,
        query: RoleChangeQuery,
    ) -> AppResult<Vec<RoleChangeAuditEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|(_, audit)| audit.organization_id == organization_id)
            .skip(query.offset)
            .take(query.limit.clamp(1, RoleChangeQuery::MAX_LIMIT))
            .map(|(event_id, audit)| RoleChangeAuditEntry {
                event_id: event_id.clone(),
                target_principal_id: audit.target_principal_id,
                from_role_id: audit.from_role_id,
                to_role_id: audit.to_role_id,
                changed_by: audit.changed_by,
                description: audit.description.clone(),
                changed_at: audit.changed_at,
            })
            .collect())
    }
}
