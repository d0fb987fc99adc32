use meterline_application::CompletenessReport;
use meterline_domain::{Branch, Organization, Profile, UserContext};
use serde::Serialize;
use ts_rs::TS;

use super::organization::RoleResponse;

/// Resolved organization context of the authenticated principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-context-response.ts"
)]
pub struct UserContextResponse {
    pub principal_id: String,
    pub organization_id: String,
    pub branch_id: String,
    pub role: RoleResponse,
    pub permissions: Vec<String>,
}

impl From<UserContext> for UserContextResponse {
    fn from(context: UserContext) -> Self {
        Self {
            principal_id: context.principal_id().to_string(),
            organization_id: context.organization_id().to_string(),
            branch_id: context.branch_id().to_string(),
            role: RoleResponse::from(context.role().clone()),
            permissions: context
                .permissions()
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// Profile fields relevant to onboarding.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/profile-response.ts"
)]
pub struct ProfileResponse {
    pub principal_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role_id: Option<String>,
    pub organization_id: Option<String>,
    pub branch_id: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            principal_id: profile.principal_id.to_string(),
            email: profile.email,
            full_name: profile.full_name,
            role_id: profile.role_id.map(|value| value.to_string()),
            organization_id: profile.organization_id.map(|value| value.to_string()),
            branch_id: profile.branch_id.map(|value| value.to_string()),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/organization-response.ts"
)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
}

impl From<Organization> for OrganizationResponse {
    fn from(organization: Organization) -> Self {
        Self {
            id: organization.id.to_string(),
            name: organization.name,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/branch-response.ts"
)]
pub struct BranchResponse {
    pub id: String,
    pub organization_id: String,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
}

impl From<Branch> for BranchResponse {
    fn from(branch: Branch) -> Self {
        Self {
            id: branch.id.to_string(),
            organization_id: branch.organization_id.to_string(),
            name: branch.name,
            city: branch.city,
            country: branch.country,
            currency: branch.currency,
            timezone: branch.timezone,
            phone_number: branch.phone_number,
            is_active: branch.is_active,
        }
    }
}

/// Onboarding completeness of the authenticated principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/completeness-report-response.ts"
)]
pub struct CompletenessReportResponse {
    pub is_complete: bool,
    /// Stable keys such as `full_name` or `branch_city`.
    pub missing_fields: Vec<String>,
    pub profile: Option<ProfileResponse>,
    pub organization: Option<OrganizationResponse>,
    pub branch: Option<BranchResponse>,
}

impl From<CompletenessReport> for CompletenessReportResponse {
    fn from(report: CompletenessReport) -> Self {
        Self {
            is_complete: report.is_complete,
            missing_fields: report
                .missing_fields
                .iter()
                .map(|field| field.as_str().to_owned())
                .collect(),
            profile: report.profile.map(ProfileResponse::from),
            organization: report.organization.map(OrganizationResponse::from),
            branch: report.branch.map(BranchResponse::from),
        }
    }
}
