use super::*;

pub async fn list_principal_assignments_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Path(principal_id): Path<String>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .role_assignment_service
        .list_assignments(&actor, principal_id.parse::<PrincipalId>()?)
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let input = payload.into_input(actor.tenant_id())?;
    let assignment = state.role_assignment_service.assign(&actor, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn revoke_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthContext>,
    Json(payload): Json<RevokeRoleRequest>,
) -> ApiResult<StatusCode> {
    let input = payload.into_input(actor.tenant_id())?;
    state.role_assignment_service.revoke(&actor, input).await?;

    Ok(StatusCode::NO_CONTENT)
}
