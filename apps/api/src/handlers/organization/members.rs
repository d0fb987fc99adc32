use super::*;

pub async fn list_members_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
) -> ApiResult<Json<DataResponse<Vec<OrganizationMemberResponse>>>> {
    let members = state
        .membership_service
        .list_members(&identity)
        .await?
        .into_iter()
        .map(OrganizationMemberResponse::from)
        .collect();

    Ok(Json(DataResponse::new(members)))
}

pub async fn change_member_role_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
    Path(principal_id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> ApiResult<Json<DataResponse<RoleChangeOutcomeResponse>>> {
    let target_principal_id = PrincipalId::parse(principal_id.as_str())?;
    let outcome = state
        .membership_service
        .change_role(
            &identity,
            target_principal_id,
            payload.role.as_str(),
            payload.reason.as_deref(),
        )
        .await?;

    Ok(Json(DataResponse::new(RoleChangeOutcomeResponse::from(
        outcome,
    ))))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
    Path(principal_id): Path<String>,
) -> ApiResult<Json<DataResponse<MemberRemovalResponse>>> {
    let target_principal_id = PrincipalId::parse(principal_id.as_str())?;
    let outcome = state
        .membership_service
        .remove_member(&identity, target_principal_id)
        .await?;

    Ok(Json(DataResponse::new(MemberRemovalResponse::from(outcome))))
}

pub async fn role_change_history_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<PrincipalIdentity>,
    Query(query): Query<RoleChangeHistoryQuery>,
) -> ApiResult<Json<DataResponse<Vec<RoleChangeEntryResponse>>>> {
    let entries = state
        .membership_service
        .role_change_history(&identity, query.into())
        .await?
        .into_iter()
        .map(RoleChangeEntryResponse::from)
        .collect();

    Ok(Json(DataResponse::new(entries)))
}
