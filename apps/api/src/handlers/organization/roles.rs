use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
) -> ApiResult<Json<DataResponse<Vec<RoleResponse>>>> {
    let roles = state
        .membership_service
        .list_roles(&identity)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(DataResponse::new(roles)))
}

pub async fn assignable_roles_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
) -> ApiResult<Json<DataResponse<Vec<RoleResponse>>>> {
    let roles = state
        .membership_service
        .assignable_roles(&identity)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(DataResponse::new(roles)))
}
