use std::collections::HashMap;

use meterline_core::PrincipalIdentity;
use meterline_domain::{Permission, Role};
use tracing::warn;

use crate::tenancy_ports::{RoleChangeAuditEntry, RoleChangeQuery};

use super::*;

impl MembershipService {
    /// Lists every role of the registry for any resolved actor.
    pub async fn list_roles(&self, actor: &PrincipalIdentity) -> Result<Vec<Role>, MembershipError> {
        const OPERATION: &str = "list_roles";

        self.resolve_actor(actor, OPERATION).await?;
        self.roles
            .list_roles()
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))
    }

    /// Lists roles the actor may assign to other members.
    ///
    /// Empty for actors without a role-management permission.
    pub async fn assignable_roles(
        &self,
        actor: &PrincipalIdentity,
    ) -> Result<Vec<Role>, MembershipError> {
        const OPERATION: &str = "assignable_roles";

        let context = self.resolve_actor(actor, OPERATION).await?;
        if require_role_management(&context).is_err() {
            return Ok(Vec::new());
        }

        let roles = self
            .roles
            .list_roles()
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))?;

        Ok(roles
            .into_iter()
            .filter(|role| context.can_manage_role(role.key()))
            .collect())
    }

    /// Lists active members of the actor's organization.
    pub async fn list_members(
        &self,
        actor: &PrincipalIdentity,
    ) -> Result<Vec<OrganizationMember>, MembershipError> {
        const OPERATION: &str = "list_members";

        let requirement = PermissionRequirement::AnyOf(
            std::iter::once(Permission::ViewOrganizationDashboard)
                .chain(Permission::role_management().iter().copied())
                .collect(),
        );
        let context = self
            .authorization
            .require(actor.principal_id(), &requirement)
            .await
            .map_err(|error| authorization_error(OPERATION, error))?;

        let roles: HashMap<_, _> = self
            .roles
            .list_roles()
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))?
            .into_iter()
            .map(|role| (role.id(), role))
            .collect();

        let records = self
            .memberships
            .list_active_members(context.organization_id())
            .await
            .map_err(|fault| MembershipError::unexpected(OPERATION, &fault))?;

        let mut members = Vec::with_capacity(records.len());
        for record in records {
            let Some(role) = roles.get(&record.membership.role_id) else {
                warn!(
                    organization_id = %context.organization_id(),
                    principal_id = %record.membership.principal_id,
                    role_id = %record.membership.role_id,
                    "skipping member whose role does not resolve"
                );
                continue;
            };

            members.push(OrganizationMember {
                principal_id: record.membership.principal_id,
                email: record.email,
                full_name: record.full_name,
                branch_id: record.membership.branch_id,
                role: role.clone(),
                joined_at: record.membership.created_at,
            });
        }

        members.sort_by(|left, right| {
            left.role
                .level()
                .cmp(&right.role.level())
                .then_with(|| left.email.cmp(&right.email))
        });

        Ok(members)
    }

    /// Lists the organization's role-change audit trail, newest first.
    pub async fn role_change_history(
        &self,
        actor: &PrincipalIdentity,
        query: RoleChangeQuery,
    ) -> Result<Vec<RoleChangeAuditEntry>, MembershipError> {
        const OPERATION: &str = "role_change_history";

        let query = RoleChangeQuery::new(query.limit, query.offset);
        let audit_log = &self.audit_log_repository;
        self.authorization
            .guarded(
                actor.principal_id(),
                PermissionRequirement::Permission(Permission::ViewAuditLog),
                |context| async move {
                    audit_log
                        .list_role_changes(context.organization_id(), query)
                        .await
                },
            )
            .await
            .map_err(|error| authorization_error(OPERATION, error))
    }
}
