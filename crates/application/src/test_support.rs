use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use meterline_core::{AppError, AppResult, OrganizationId, PrincipalId, PrincipalIdentity};
use meterline_domain::{
    Branch, BranchId, Membership, MembershipStatus, Organization, Permission, Profile, Role,
    RoleId, RoleKey,
};
use tokio::sync::Mutex;

use crate::{
    ContextResolver, GuardedMutation, MemberRecord, MemberRemoval, MembershipRepository,
    OrganizationRepository, ProfileRepository, RoleChangeAudit, RoleChangeAuditEntry,
    RoleChangeAuditRepository, RoleChangeLogRepository, RoleChangeQuery, RoleRepository,
    RoleUpdate,
};

#[derive(Default)]
struct FakeState {
    roles: Vec<Role>,
    grants: HashMap<RoleId, Vec<Permission>>,
    organizations: HashMap<OrganizationId, Organization>,
    branches: HashMap<BranchId, Branch>,
    memberships: Vec<Membership>,
    profiles: HashMap<PrincipalId, Profile>,
    audits: Vec<RoleChangeAudit>,
    fail_reads: bool,
    fail_audit_writes: bool,
}

impl FakeState {
    fn is_active(&self, membership: &Membership) -> bool {
        membership.is_active()
            && self
                .profiles
                .get(&membership.principal_id)
                .is_some_and(|profile| !profile.is_deleted())
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

    fn is_last_holder_anywhere(&self, principal_id: PrincipalId, role_id: RoleId) -> bool {
        self.memberships.iter().any(|membership| {
            membership.principal_id == principal_id
                && membership.role_id == role_id
                && self.is_active(membership)
                && self.active_holders(membership.organization_id, role_id) <= 1
        })
    }

    fn active_position(
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

    fn read_guard(&self) -> AppResult<()> {
        if self.fail_reads {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }

        Ok(())
    }
}

/// Single in-test store implementing every tenancy port.
pub(crate) struct FakeTenancyStore {
    state: Mutex<FakeState>,
}

impl FakeTenancyStore {
    /// Creates a store holding the seeded role catalog.
    pub(crate) fn seeded() -> Arc<Self> {
        let mut state = FakeState::default();
        for key in RoleKey::all() {
            let role = Role::new(
                RoleId::new(),
                *key,
                key.default_display_name(),
                key.default_level(),
            );
            state.grants.insert(role.id(), key.default_grants().to_vec());
            state.roles.push(role);
        }

        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub(crate) async fn role(&self, key: RoleKey) -> Role {
        self.state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.key() == key)
            .cloned()
            .unwrap_or_else(|| panic!("role {key} is seeded"))
    }

    /// Adds an organization with one fully described branch.
    pub(crate) async fn add_organization(&self, name: &str) -> (OrganizationId, BranchId) {
        let organization_id = OrganizationId::new();
        let branch = complete_branch(organization_id);
        let branch_id = branch.id;

        let mut state = self.state.lock().await;
        state.organizations.insert(
            organization_id,
            Organization {
                id: organization_id,
                name: name.to_owned(),
            },
        );
        state.branches.insert(branch_id, branch);

        (organization_id, branch_id)
    }

    pub(crate) async fn insert_branch(&self, branch: Branch) {
        self.state.lock().await.branches.insert(branch.id, branch);
    }

    /// Adds an onboarded principal holding `key` in the organization.
    pub(crate) async fn add_member(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
        key: RoleKey,
    ) -> PrincipalIdentity {
        let role_id = self.role(key).await.id();
        let principal_id = PrincipalId::new();
        let email = format!("{}@meterline.test", principal_id.as_uuid().simple());

        let mut profile = Profile::new(principal_id, email.clone());
        profile.full_name = Some(format!("Member {key}"));
        profile.role_id = Some(role_id);
        profile.organization_id = Some(organization_id);
        profile.branch_id = Some(branch_id);

        let now = Utc::now();
        let mut state = self.state.lock().await;
        state.profiles.insert(principal_id, profile);
        state.memberships.push(Membership {
            principal_id,
            organization_id,
            branch_id: Some(branch_id),
            role_id,
            status: MembershipStatus::Active,
            created_at: now,
            updated_at: now,
        });

        PrincipalIdentity::new(principal_id, email)
    }

    /// Gives an existing principal an active membership in another organization.
    pub(crate) async fn join_organization(
        &self,
        principal_id: PrincipalId,
        organization_id: OrganizationId,
        branch_id: BranchId,
        key: RoleKey,
    ) {
        let role_id = self.role(key).await.id();
        let now = Utc::now();
        self.state.lock().await.memberships.push(Membership {
            principal_id,
            organization_id,
            branch_id: Some(branch_id),
            role_id,
            status: MembershipStatus::Active,
            created_at: now,
            updated_at: now,
        });
    }

    pub(crate) async fn insert_profile(&self, profile: Profile) {
        self.state
            .lock()
            .await
            .profiles
            .insert(profile.principal_id, profile);
    }

    pub(crate) async fn insert_membership(&self, membership: Membership) {
        self.state.lock().await.memberships.push(membership);
    }

    pub(crate) async fn set_grants(&self, key: RoleKey, grants: Vec<Permission>) {
        let role_id = self.role(key).await.id();
        self.state.lock().await.grants.insert(role_id, grants);
    }

    pub(crate) async fn remove_role(&self, key: RoleKey) {
        self.state
            .lock()
            .await
            .roles
            .retain(|role| role.key() != key);
    }

    pub(crate) async fn fail_reads(&self) {
        self.state.lock().await.fail_reads = true;
    }

    pub(crate) async fn fail_audit_writes(&self) {
        self.state.lock().await.fail_audit_writes = true;
    }

    pub(crate) async fn audits(&self) -> Vec<RoleChangeAudit> {
        self.state.lock().await.audits.clone()
    }

    pub(crate) async fn active_holders(&self, organization_id: OrganizationId, key: RoleKey) -> usize {
        let role_id = self.role(key).await.id();
        self.state
            .lock()
            .await
            .active_holders(organization_id, role_id)
    }

    pub(crate) async fn membership_role(
        &self,
        organization_id: OrganizationId,
        principal_id: PrincipalId,
    ) -> Option<RoleId> {
        self.state
            .lock()
            .await
            .memberships
            .iter()
            .find(|membership| {
                membership.organization_id == organization_id
                    && membership.principal_id == principal_id
            })
            .map(|membership| membership.role_id)
    }

    pub(crate) async fn profile(&self, principal_id: PrincipalId) -> Option<Profile> {
        self.state.lock().await.profiles.get(&principal_id).cloned()
    }
}

/// Returns a branch with every onboarding attribute filled.
pub(crate) fn complete_branch(organization_id: OrganizationId) -> Branch {
    Branch {
        id: BranchId::new(),
        organization_id,
        name: Some("Harbour Substation".to_owned()),
        city: Some("Aarhus".to_owned()),
        country: Some("Denmark".to_owned()),
        currency: Some("DKK".to_owned()),
        timezone: Some("Europe/Copenhagen".to_owned()),
        phone_number: None,
        is_active: true,
    }
}

pub(crate) fn resolver(store: &Arc<FakeTenancyStore>) -> ContextResolver {
    ContextResolver::new(store.clone(), store.clone(), store.clone(), store.clone())
}

#[async_trait]
impl RoleRepository for FakeTenancyStore {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        let mut roles = state.roles.clone();
        roles.sort_by_key(Role::level);
        Ok(roles)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state.roles.iter().find(|role| role.id() == role_id).cloned())
    }

    async fn find_role_by_key(&self, key: RoleKey) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state.roles.iter().find(|role| role.key() == key).cloned())
    }

    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state.grants.get(&role_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MembershipRepository for FakeTenancyStore {
    async fn list_active_memberships_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<Membership>> {
        let state = self.state.lock().await;
        state.read_guard()?;
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
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state
            .active_position(organization_id, principal_id)
            .map(|index| state.memberships[index].clone()))
    }

    async fn list_active_members(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<MemberRecord>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state
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
            .collect())
    }

    async fn count_active_role_holders(
        &self,
        organization_id: OrganizationId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state.active_holders(organization_id, role_id) as u64)
    }

    async fn update_member_role(
        &self,
        input: RoleUpdate,
    ) -> AppResult<GuardedMutation<Membership>> {
        let mut state = self.state.lock().await;
        let index = state
            .active_position(input.organization_id, input.principal_id)
            .ok_or_else(|| AppError::NotFound("membership not found".to_owned()))?;

        if let Some(guard) = input.guard {
            let current = state.memberships[index].role_id;
            if current == guard.role_id
                && input.role_id != guard.role_id
                && state.active_holders(input.organization_id, guard.role_id) <= 1
            {
                return Ok(GuardedMutation::LastHolderBlocked);
            }
        }

        let membership = &mut state.memberships[index];
        membership.role_id = input.role_id;
        membership.updated_at = Utc::now();
        Ok(GuardedMutation::Applied(membership.clone()))
    }

    async fn soft_delete_member(&self, input: MemberRemoval) -> AppResult<GuardedMutation<()>> {
        let mut state = self.state.lock().await;
        if state
            .active_position(input.organization_id, input.principal_id)
            .is_none()
        {
            return Err(AppError::NotFound("membership not found".to_owned()));
        }

        if let Some(guard) = input.guard
            && state.is_last_holder_anywhere(input.principal_id, guard.role_id)
        {
            return Ok(GuardedMutation::LastHolderBlocked);
        }

        let profile = state
            .profiles
            .get_mut(&input.principal_id)
            .ok_or_else(|| AppError::NotFound("profile not found".to_owned()))?;
        profile.deleted_at = Some(Utc::now());
        profile.deleted_by = Some(input.removed_by);
        Ok(GuardedMutation::Applied(()))
    }
}

#[async_trait]
impl ProfileRepository for FakeTenancyStore {
    async fn find_profile(&self, principal_id: PrincipalId) -> AppResult<Option<Profile>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state.profiles.get(&principal_id).cloned())
    }
}

#[async_trait]
impl OrganizationRepository for FakeTenancyStore {
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state.organizations.get(&organization_id).cloned())
    }

    async fn find_branch(&self, branch_id: BranchId) -> AppResult<Option<Branch>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state.branches.get(&branch_id).cloned())
    }
}

#[async_trait]
impl RoleChangeAuditRepository for FakeTenancyStore {
    async fn append_role_change(&self, audit: RoleChangeAudit) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_audit_writes {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }

        state.audits.push(audit);
        Ok(())
    }
}

#[async_trait]
impl RoleChangeLogRepository for FakeTenancyStore {
    async fn list_role_changes(
        &self,
        organization_id: OrganizationId,
        query: RoleChangeQuery,
    ) -> AppResult<Vec<RoleChangeAuditEntry>> {
        let state = self.state.lock().await;
        state.read_guard()?;
        Ok(state
            .audits
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, audit)| audit.organization_id == organization_id)
            .skip(query.offset)
            .take(query.limit)
            .map(|(index, audit)| RoleChangeAuditEntry {
                event_id: index.to_string(),
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
