use axum::extract::State;
use tracing::instrument;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::roles::{MyPermissions, RoleWithPermissions};

use super::service::RoleService;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::state::AppState;

/// List roles and the permissions each grants
#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "Roles", body = Vec<RoleWithPermissions>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_roles(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<ApiResponse<Vec<RoleWithPermissions>>, AppError> {
    let roles = RoleService::list_roles(&state.db).await?;
    Ok(ApiResponse::ok(
        roles.into_iter().map(RoleWithPermissions::from).collect(),
    ))
}

/// The caller's roles and effective permissions
#[utoipa::path(
    get,
    path = "/api/roles/me",
    responses(
        (status = 200, description = "Caller permissions", body = MyPermissions),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn my_permissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<MyPermissions>, AppError> {
    let permissions = RoleService::my_permissions(&state.db, auth_user.user_id()?).await?;
    Ok(ApiResponse::ok(permissions))
}
