use std::str::FromStr;

use chrono::Utc;
use meterline_core::{AppError, PrincipalId, PrincipalIdentity};
use meterline_domain::RoleKey;
use tracing::{info, warn};

use crate::tenancy_ports::{GuardedMutation, LastHolderGuard, RoleChangeAudit, RoleUpdate};

use super::*;

impl MembershipService {
    /// Reassigns the role of another member of the actor's organization.
    ///
    /// Preconditions, first failure wins: the actor resolves, the target is
    /// not the actor, the actor holds a role-management permission, the role
    /// exists, the target is an active member, and the actor has authority
    /// over both the current and the requested role.
    ///
    /// The audit row is written after the role update commits. A failed audit
    /// write is logged and does not undo the change.
    pub async fn change_role(
        &self,
        actor: &PrincipalIdentity,
        target_principal_id: PrincipalId,
        new_role: &str,
        reason: Option<&str>,
    ) -> Result<RoleChangeOutcome, MembershipError> {
        const OPERATION: &str = "change_role";

        let context = self.resolve_actor(actor, OPERATION).await?;

        if target_principal_id == context.principal_id() {
            return Err(MembershipError::SelfRoleChange);
        }

        require_role_management(&context)?;

        let new_role_key =
            RoleKey::from_str(new_role.trim()).map_err(|_| MembershipError::InvalidRole)?;
        let to_role = self
            .roles
            .find_role_by_key(new_role_key)
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))?
            .ok_or(MembershipError::InvalidRole)?;

        let organization_id = context.organization_id();
        let organization_guard = self.locks.acquire(organization_id).await;

        let membership = self
            .memberships
            .find_active_membership(organization_id, target_principal_id)
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))?
            .ok_or(MembershipError::MemberNotFound)?;

        let from_role = self
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

        if !context.can_manage_role(from_role.key()) || !context.can_manage_role(to_role.key()) {
            return Err(MembershipError::InsufficientPermissions);
        }

        if from_role.id() == to_role.id() {
            return Ok(RoleChangeOutcome {
                organization_id,
                target_principal_id,
                from_role,
                to_role,
                changed: false,
                audit_recorded: false,
            });
        }

        let guard = from_role
            .key()
            .is_top_authority()
            .then(|| LastHolderGuard {
                role_id: from_role.id(),
            });

        let update = self
            .memberships
            .update_member_role(RoleUpdate {
                organization_id,
                principal_id: target_principal_id,
                role_id: to_role.id(),
                guard,
            })
            .await;

        match update {
            Ok(GuardedMutation::Applied(_)) => {}
            Ok(GuardedMutation::LastHolderBlocked) => {
                return Err(MembershipError::LastExecutiveDemotion);
            }
            Err(AppError::NotFound(_)) => return Err(MembershipError::MemberNotFound),
            Err(fault) => return Err(MembershipError::unexpected(OPERATION, &fault)),
        }

        drop(organization_guard);

        info!(
            %organization_id,
            actor = %context.principal_id(),
            target = %target_principal_id,
            from_role = %from_role.key(),
            to_role = %to_role.key(),
            "member role changed"
        );

        let description = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| {
                format!(
                    "role changed from {} to {}",
                    from_role.display_name(),
                    to_role.display_name()
                )
            });

        let audit_recorded = match self
            .audit_repository
            .append_role_change(RoleChangeAudit {
                organization_id,
                target_principal_id,
                from_role_id: from_role.id(),
                to_role_id: to_role.id(),
                changed_by: context.principal_id(),
                description,
                changed_at: Utc::now(),
            })
            .await
        {
            Ok(()) => true,
            Err(fault) => {
                warn!(
                    %organization_id,
                    target = %target_principal_id,
                    %fault,
                    "role change committed but audit write failed"
                );
                false
            }
        };

        Ok(RoleChangeOutcome {
            organization_id,
            target_principal_id,
            from_role,
            to_role,
            changed: true,
            audit_recorded,
        })
    }
}
