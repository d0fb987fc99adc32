use meterline_application::{
    MemberRemovalOutcome, OrganizationMember, RoleChangeAuditEntry, RoleChangeOutcome,
    RoleChangeQuery,
};
use meterline_domain::Role;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: String,
    pub key: String,
    pub display_name: String,
    /// Lower values carry more authority.
    pub level: u8,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id().to_string(),
            key: role.key().as_str().to_owned(),
            display_name: role.display_name().to_owned(),
            level: role.level().value(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/organization-member-response.ts"
)]
pub struct OrganizationMemberResponse {
    pub principal_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub branch_id: Option<String>,
    pub role: RoleResponse,
    pub joined_at: String,
}

impl From<OrganizationMember> for OrganizationMemberResponse {
    fn from(member: OrganizationMember) -> Self {
        Self {
            principal_id: member.principal_id.to_string(),
            email: member.email,
            full_name: member.full_name,
            branch_id: member.branch_id.map(|value| value.to_string()),
            role: RoleResponse::from(member.role),
            joined_at: member.joined_at.to_rfc3339(),
        }
    }
}

/// Incoming payload for a member role change.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-role-request.ts"
)]
pub struct ChangeRoleRequest {
    /// Role key such as `branch_manager`.
    pub role: String,
    #[ts(optional)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-change-outcome-response.ts"
)]
pub struct RoleChangeOutcomeResponse {
    pub target_principal_id: String,
    pub from_role: RoleResponse,
    pub to_role: RoleResponse,
    pub changed: bool,
    pub audit_recorded: bool,
}

impl From<RoleChangeOutcome> for RoleChangeOutcomeResponse {
    fn from(outcome: RoleChangeOutcome) -> Self {
        Self {
            target_principal_id: outcome.target_principal_id.to_string(),
            from_role: RoleResponse::from(outcome.from_role),
            to_role: RoleResponse::from(outcome.to_role),
            changed: outcome.changed,
            audit_recorded: outcome.audit_recorded,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/member-removal-response.ts"
)]
pub struct MemberRemovalResponse {
    pub removed_principal_id: String,
}

impl From<MemberRemovalOutcome> for MemberRemovalResponse {
    fn from(outcome: MemberRemovalOutcome) -> Self {
        Self {
            removed_principal_id: outcome.removed_principal_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-change-entry-response.ts"
)]
pub struct RoleChangeEntryResponse {
    pub event_id: String,
    pub target_principal_id: String,
    pub from_role_id: String,
    pub to_role_id: String,
    pub changed_by: String,
    pub description: String,
    pub changed_at: String,
}

impl From<RoleChangeAuditEntry> for RoleChangeEntryResponse {
    fn from(entry: RoleChangeAuditEntry) -> Self {
        Self {
            event_id: entry.event_id,
            target_principal_id: entry.target_principal_id.to_string(),
            from_role_id: entry.from_role_id.to_string(),
            to_role_id: entry.to_role_id.to_string(),
            changed_by: entry.changed_by.to_string(),
            description: entry.description,
            changed_at: entry.changed_at.to_rfc3339(),
        }
    }
}

/// Paging parameters of the role-change history endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RoleChangeHistoryQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<RoleChangeHistoryQuery> for RoleChangeQuery {
    fn from(query: RoleChangeHistoryQuery) -> Self {
        let defaults = RoleChangeQuery::default();
        RoleChangeQuery::new(
            query.limit.unwrap_or(defaults.limit),
            query.offset.unwrap_or(defaults.offset),
        )
    }
}
