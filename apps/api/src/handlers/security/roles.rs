use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles(&actor)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_service
        .create_role(&actor, CreateRoleInput::try_from(payload)?)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .update_role(
            &actor,
            role_id.parse::<RoleId>()?,
            UpdateRoleInput::try_from(payload)?,
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .role_service
        .delete_role(&actor, role_id.parse::<RoleId>()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn clone_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(role_id): Path<String>,
    Json(payload): Json<CloneRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_service
        .clone_role(
            &actor,
            role_id.parse::<RoleId>()?,
            CloneRoleInput::from(payload),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}
