use meterline_core::{AppError, PrincipalId, PrincipalIdentity};
use tracing::{debug, info};

use crate::tenancy_ports::{GuardedMutation, LastHolderGuard, MemberRemoval};

use super::*;

impl MembershipService {
    /// Removes another member from the actor's organization.
    ///
    /// Removal soft-deletes the member's profile, which ends every membership
    /// the principal holds. It is refused while the target is the last active
    /// executive of any organization.
    pub async fn remove_member(
        &self,
        actor: &PrincipalIdentity,
        target_principal_id: PrincipalId,
    ) -> Result<MemberRemovalOutcome, MembershipError> {
        const OPERATION: &str = "remove_member";

        let context = self.resolve_actor(actor, OPERATION).await?;

        if target_principal_id == context.principal_id() {
            return Err(MembershipError::SelfRemoval);
        }

        require_role_management(&context)?;

        let organization_id = context.organization_id();
        let _organization_guard = self.locks.acquire(organization_id).await;

        let membership = self
            .memberships
            .find_active_membership(organization_id, target_principal_id)
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))?
            .ok_or(MembershipError::MemberNotFound)?;

        let target_role = self
            .roles
            .find_role(membership.role_id)
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))?
            .ok_or_else(|| {
                MembershipError::unexpected(
                    OPERATION,
                    &AppError::Internal(format!(
                        "role '{}' of member '{target_principal_id}' does not resolve",
                        membership.role_id
                    )),
                )
            })?;

        if !context.can_manage_role(target_role.key()) {
            return Err(MembershipError::InsufficientPermissions);
        }

        let guard = self
            .top_authority_guard(target_principal_id, OPERATION)
            .await?;

        let removal = self
            .memberships
            .soft_delete_member(MemberRemoval {
                organization_id,
                principal_id: target_principal_id,
                removed_by: context.principal_id(),
                guard,
            })
            .await;

        match removal {
            Ok(GuardedMutation::Applied(())) => {}
            Ok(GuardedMutation::LastHolderBlocked) => return Err(MembershipError::LastExecutive),
            Err(AppError::NotFound(_)) => return Err(MembershipError::MemberNotFound),
            Err(fault) => return Err(MembershipError::unexpected(OPERATION, &fault)),
        }

        info!(
            %organization_id,
            actor = %context.principal_id(),
            target = %target_principal_id,
            role = %target_role.key(),
            "member removed"
        );

        Ok(MemberRemovalOutcome {
            organization_id,
            removed_principal_id: target_principal_id,
        })
    }

    async fn top_authority_guard(
        &self,
        principal_id: PrincipalId,
        operation: &'static str,
    ) -> Result<Option<LastHolderGuard>, MembershipError> {
        let memberships = self
            .memberships
            .list_active_memberships_for_principal(principal_id)
            .await
            .map_err(|fault| MembershipError::unexpected(operation, &fault))?;

        let mut guard = None;
        for membership in memberships {
            let role = self
                .roles
                .find_role(membership.role_id)
                .await
                .map_err(|fault| MembershipError::unexpected(operation, &fault))?;
            let Some(role) = role.filter(|role| role.key().is_top_authority()) else {
                continue;
            };

            let holders = self
                .memberships
                .count_active_role_holders(membership.organization_id, role.id())
                .await
                .map_err(|fault| MembershipError::unexpected(operation, &fault))?;

            if holders <= 1 {
                debug!(
                    organization_id = %membership.organization_id,
                    %principal_id,
                    "removal would leave organization without an executive"
                );
                return Err(MembershipError::LastExecutive);
            }

            guard = Some(LastHolderGuard { role_id: role.id() });
        }

        Ok(guard)
    }
}
