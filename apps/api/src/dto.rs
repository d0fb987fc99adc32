mod common;
mod context;
mod organization;

pub use common::{DataResponse, HealthResponse};
pub use context::{
    BranchResponse, CompletenessReportResponse, OrganizationResponse, ProfileResponse,
    UserContextResponse,
};
pub use organization::{
    ChangeRoleRequest, MemberRemovalResponse, OrganizationMemberResponse, RoleChangeEntryResponse,
    RoleChangeHistoryQuery, RoleChangeOutcomeResponse, RoleResponse,
};
