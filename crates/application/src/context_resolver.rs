use std::sync::Arc;

use meterline_core::{AppError, AppResult, PrincipalId};
use meterline_domain::{Membership, UserContext};
use tracing::{debug, error, warn};

use crate::{MembershipRepository, OrganizationRepository, ProfileRepository, RoleRepository};

/// Resolves the organization context of a principal.
///
/// Every call reads the backing store; nothing is cached between calls.
#[derive(Clone)]
pub struct ContextResolver {
    memberships: Arc<dyn MembershipRepository>,
    profiles: Arc<dyn ProfileRepository>,
    roles: Arc<dyn RoleRepository>,
    organizations: Arc<dyn OrganizationRepository>,
}

impl ContextResolver {
    /// Creates a resolver from the membership, profile, registry and
    /// organization ports.
    #[must_use]
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        profiles: Arc<dyn ProfileRepository>,
        roles: Arc<dyn RoleRepository>,
        organizations: Arc<dyn OrganizationRepository>,
    ) -> Self {
        Self {
            memberships,
            profiles,
            roles,
            organizations,
        }
    }

    /// Resolves the current context of `principal_id`.
    ///
    /// A principal active in several organizations resolves inside the
    /// organization its profile currently points at. Returns `Ok(None)` when
    /// no usable active membership exists, including memberships whose role
    /// or branch no longer resolves. More than one active membership in the
    /// current organization is a data fault and returns an error.
    pub async fn resolve(&self, principal_id: PrincipalId) -> AppResult<Option<UserContext>> {
        let mut memberships = self
            .memberships
            .list_active_memberships_for_principal(principal_id)
            .await?;

        let membership = match memberships.len() {
            0 => None,
            1 => memberships.pop(),
            _ => self.current_membership(principal_id, memberships).await?,
        };

        let Some(membership) = membership else {
            debug!(%principal_id, "no usable active membership");
            return Ok(None);
        };

        let Some(branch_id) = membership.branch_id else {
            warn!(
                %principal_id,
                organization_id = %membership.organization_id,
                "active membership has no branch"
            );
            return Ok(None);
        };

        let branch = self.organizations.find_branch(branch_id).await?;
        if !branch.is_some_and(|branch| branch.belongs_to(membership.organization_id)) {
            warn!(
                %principal_id,
                %branch_id,
                organization_id = %membership.organization_id,
                "membership branch does not resolve inside its organization"
            );
            return Ok(None);
        }

        let Some(role) = self.roles.find_role(membership.role_id).await? else {
            warn!(
                %principal_id,
                role_id = %membership.role_id,
                "membership role does not resolve"
            );
            return Ok(None);
        };

        let permissions = self.roles.list_permissions_for_role(role.id()).await?;

        Ok(Some(UserContext::new(
            principal_id,
            membership.organization_id,
            branch_id,
            role,
            permissions,
        )))
    }

    async fn current_membership(
        &self,
        principal_id: PrincipalId,
        memberships: Vec<Membership>,
    ) -> AppResult<Option<Membership>> {
        let current_organization = self
            .profiles
            .find_profile(principal_id)
            .await?
            .and_then(|profile| profile.organization_id);

        let Some(organization_id) = current_organization else {
            warn!(
                %principal_id,
                count = memberships.len(),
                "principal is active in several organizations without a current one"
            );
            return Ok(None);
        };

        let mut current: Vec<Membership> = memberships
            .into_iter()
            .filter(|membership| membership.organization_id == organization_id)
            .collect();

        match current.len() {
            0 => {
                warn!(
                    %principal_id,
                    %organization_id,
                    "current organization has no active membership"
                );
                Ok(None)
            }
            1 => Ok(current.pop()),
            count => {
                error!(
                    %principal_id,
                    %organization_id,
                    count,
                    "principal holds more than one active membership in one organization"
                );
                Err(AppError::Internal(format!(
                    "principal '{principal_id}' holds {count} active memberships in organization '{organization_id}'"
                )))
            }
        }
    }
}
