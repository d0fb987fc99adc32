use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use meterline_core::{PrincipalId, PrincipalIdentity};

use crate::dto::{
    ChangeRoleRequest, DataResponse, MemberRemovalResponse, OrganizationMemberResponse,
    RoleChangeEntryResponse, RoleChangeHistoryQuery, RoleChangeOutcomeResponse, RoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod members;
mod roles;

pub use members::{
    change_member_role_handler, list_members_handler, remove_member_handler,
    role_change_history_handler,
};
pub use roles::{assignable_roles_handler, list_roles_handler};
