use std::fmt::{Display, Formatter};
use std::str::FromStr;

use meterline_core::AppError;
use serde::{Deserialize, Serialize};

/// Capabilities enforced by authorization guard checks.
///
/// Storage and transport keys are part of the external contract and must stay
/// byte-for-byte stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading organization-wide dashboards.
    ViewOrganizationDashboard,
    /// Allows reading dashboards of the principal's own branch.
    ViewBranchDashboard,
    /// Allows editing organization profile and settings.
    ManageOrganizationSettings,
    /// Allows creating and updating branches.
    ManageBranches,
    /// Allows assigning and revoking the branch manager role.
    ManageBranchManagers,
    /// Allows assigning and revoking the grid administrator role.
    ManageGridAdministrators,
    /// Allows registering and configuring meters.
    ManageMeters,
    /// Allows reading meter telemetry.
    ViewMeterReadings,
    /// Allows editing tariff configuration.
    ManageTariffs,
    /// Allows reading the role-change audit trail.
    ViewAuditLog,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewOrganizationDashboard => "view_organization_dashboard",
            Self::ViewBranchDashboard => "view_branch_dashboard",
            Self::ManageOrganizationSettings => "manage_organization_settings",
            Self::ManageBranches => "manage_branches",
            Self::ManageBranchManagers => "manage_branch_managers",
            Self::ManageGridAdministrators => "manage_grid_administrators",
            Self::ManageMeters => "manage_meters",
            Self::ViewMeterReadings => "view_meter_readings",
            Self::ManageTariffs => "manage_tariffs",
            Self::ViewAuditLog => "view_audit_log",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ViewOrganizationDashboard,
            Permission::ViewBranchDashboard,
            Permission::ManageOrganizationSettings,
            Permission::ManageBranches,
            Permission::ManageBranchManagers,
            Permission::ManageGridAdministrators,
            Permission::ManageMeters,
            Permission::ViewMeterReadings,
            Permission::ManageTariffs,
            Permission::ViewAuditLog,
        ];

        ALL
    }

    /// Permissions that allow changing or removing other members.
    #[must_use]
    pub fn role_management() -> &'static [Self] {
        const ROLE_MANAGEMENT: &[Permission] = &[
            Permission::ManageBranchManagers,
            Permission::ManageGridAdministrators,
        ];

        ROLE_MANAGEMENT
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}
