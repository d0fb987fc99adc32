use axum::Json;
use axum::extract::{Extension, State};
use meterline_core::{AppError, PrincipalIdentity};

use crate::dto::{CompletenessReportResponse, DataResponse, UserContextResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn context_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
) -> ApiResult<Json<DataResponse<UserContextResponse>>> {
    let context = state
        .authorization_service
        .resolve_context(identity.principal_id())
        .await?
        .ok_or_else(|| AppError::NotFound("no active organization membership".to_owned()))?;

    Ok(Json(DataResponse::new(UserContextResponse::from(context))))
}

pub async fn onboarding_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
) -> ApiResult<Json<DataResponse<CompletenessReportResponse>>> {
    let report = state
        .onboarding_service
        .check_completeness(identity.principal_id())
        .await?;

    Ok(Json(DataResponse::new(CompletenessReportResponse::from(
        report,
    ))))
}
