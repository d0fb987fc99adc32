use chrono::{DateTime, Utc};
use meterline_core::{OrganizationId, PrincipalId};
use meterline_domain::RoleId;

/// Immutable role-change audit payload emitted by the role-change workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChangeAudit {
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Member whose role changed.
    pub target_principal_id: PrincipalId,
    /// Role held before the change.
    pub from_role_id: RoleId,
    /// Role held after the change.
    pub to_role_id: RoleId,
    /// Actor that performed the change.
    pub changed_by: PrincipalId,
    /// Human-readable description naming both roles.
    pub description: String,
    /// Change timestamp.
    pub changed_at: DateTime<Utc>,
}

/// Audit trail projection for administrative views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChangeAuditEntry {
    /// Stable event identifier.
    pub event_id: String,
    /// Member whose role changed.
    pub target_principal_id: PrincipalId,
    /// Role held before the change.
    pub from_role_id: RoleId,
    /// Role held after the change.
    pub to_role_id: RoleId,
    /// Actor that performed the change.
    pub changed_by: PrincipalId,
    /// Recorded description.
    pub description: String,
    /// Change timestamp.
    pub changed_at: DateTime<Utc>,
}

/// Query parameters for audit trail listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChangeQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl RoleChangeQuery {
    /// Largest page size served in one call.
    pub const MAX_LIMIT: usize = 200;

    /// Creates a query with `limit` clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset,
        }
    }
}

impl Default for RoleChangeQuery {
    fn default() -> Self {
        Self::new(50, 0)
    }
}
