use std::str::FromStr;

use chrono::{DateTime, Utc};
use meterline_core::{AppError, OrganizationId, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::{BranchId, RoleId};

/// Lifecycle state of an organization membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Membership grants access.
    Active,
    /// Membership is paused by an administrator.
    Suspended,
    /// Membership ended and never grants access again.
    Revoked,
}

impl MembershipStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Revoked => "revoked",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "revoked" => Ok(Self::Revoked),
            _ => Err(AppError::Validation(format!(
                "unknown membership status '{value}'"
            ))),
        }
    }
}

/// Link between a principal and one organization, branch and role.
///
/// At most one active membership exists per principal and organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Member principal.
    pub principal_id: PrincipalId,
    /// Organization the membership belongs to.
    pub organization_id: OrganizationId,
    /// Assigned branch. Missing only when onboarding was interrupted.
    pub branch_id: Option<BranchId>,
    /// Assigned role.
    pub role_id: RoleId,
    /// Lifecycle state.
    pub status: MembershipStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Returns whether the membership currently grants access.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::MembershipStatus;

    #[test]
    fn status_roundtrip_storage_value() {
        for status in [
            MembershipStatus::Active,
            MembershipStatus::Suspended,
            MembershipStatus::Revoked,
        ] {
            assert!(matches!(MembershipStatus::from_str(status.as_str()), Ok(value) if value == status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(MembershipStatus::from_str("pending").is_err());
    }
}
