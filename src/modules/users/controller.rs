use axum::extract::{Query, State};
use tracing::instrument;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::UserId;
use schoolboard_models::users::{ApproveUserDto, RejectedUser, UserListQuery, UserResponse};

use super::service::UserService;
use crate::metrics::{track_user_approved, track_user_rejected};
use crate::state::AppState;
use crate::validator::{ValidPath, ValidatedJson};

/// List users, newest first
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Paginated users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<ApiResponse<Vec<UserResponse>>, AppError> {
    let (users, meta) = UserService::list_users(&state.db, query).await?;
    Ok(ApiResponse::paginated(users, meta))
}

/// Activate a pending user and grant a role
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/approve",
    params(("id" = String, Path, description = "User ID")),
    request_body = ApproveUserDto,
    responses(
        (status = 200, description = "User approved", body = UserResponse),
        (status = 400, description = "User already active"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn approve_user(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<UserId>,
    ValidatedJson(dto): ValidatedJson<ApproveUserDto>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = UserService::approve_user(&state.db, id, dto.role).await?;
    track_user_approved(dto.role.as_str());
    Ok(ApiResponse::ok(user).with_message("User approved"))
}

/// Delete a pending registration
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}/reject",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User rejected and deleted", body = RejectedUser),
        (status = 400, description = "User is active or has roles"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reject_user(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<UserId>,
) -> Result<ApiResponse<RejectedUser>, AppError> {
    let rejected = UserService::reject_user(&state.db, id).await?;
    track_user_rejected();
    Ok(ApiResponse::ok(rejected).with_message("User rejected"))
}
