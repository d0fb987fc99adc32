use chrono::{DateTime, Utc};
use meterline_core::{OrganizationId, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::organization::is_filled;
use crate::{BranchId, RoleId};

/// Principal profile maintained alongside the external auth record.
///
/// Removal from an organization soft-deletes the profile, which takes the
/// principal out of every organization at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Principal the profile belongs to.
    pub principal_id: PrincipalId,
    /// Contact email.
    pub email: String,
    /// Full display name.
    pub full_name: Option<String>,
    /// Role chosen during onboarding.
    pub role_id: Option<RoleId>,
    /// Organization chosen during onboarding.
    pub organization_id: Option<OrganizationId>,
    /// Branch chosen during onboarding.
    pub branch_id: Option<BranchId>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Principal that performed the soft delete.
    pub deleted_by: Option<PrincipalId>,
}

impl Profile {
    /// Creates an empty profile for a freshly signed-up principal.
    #[must_use]
    pub fn new(principal_id: PrincipalId, email: impl Into<String>) -> Self {
        Self {
            principal_id,
            email: email.into(),
            full_name: None,
            role_id: None,
            organization_id: None,
            branch_id: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Returns whether the profile has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether a non-blank full name is set.
    #[must_use]
    pub fn has_full_name(&self) -> bool {
        is_filled(self.full_name.as_deref())
    }
}
