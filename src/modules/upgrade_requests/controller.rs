use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::UpgradeRequestId;
use schoolboard_models::upgrade_requests::{
    CreateUpgradeRequestDto, PermissionUpgradeRequest, ReviewUpgradeRequestDto,
    UpgradeRequestQuery, UpgradeRequestWithUser,
};

use super::service::{ReviewDecision, UpgradeRequestService};
use crate::metrics::track_upgrade_request_reviewed;
use crate::middleware::auth::{AuthUser, RequireUpgradeReview};
use crate::state::AppState;
use crate::validator::{ValidPath, ValidatedJson};

/// Ask for a higher role
#[utoipa::path(
    post,
    path = "/api/permission-upgrade-requests",
    request_body = CreateUpgradeRequestDto,
    responses(
        (status = 201, description = "Request submitted", body = PermissionUpgradeRequest),
        (status = 400, description = "Validation error or role already held"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A pending request already exists")
    ),
    tag = "Upgrade Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateUpgradeRequestDto>,
) -> Result<(StatusCode, ApiResponse<PermissionUpgradeRequest>), AppError> {
    let request = UpgradeRequestService::create(&state.db, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(request)))
}

#[utoipa::path(
    get,
    path = "/api/permission-upgrade-requests/mine",
    responses(
        (status = 200, description = "The caller's requests, newest first", body = Vec<PermissionUpgradeRequest>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Upgrade Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn my_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<Vec<PermissionUpgradeRequest>>, AppError> {
    let requests = UpgradeRequestService::list_for_user(&state.db, auth_user.user_id()?).await?;
    Ok(ApiResponse::ok(requests))
}

#[utoipa::path(
    get,
    path = "/api/admin/permission-upgrade-requests",
    params(UpgradeRequestQuery),
    responses(
        (status = 200, description = "Paginated requests", body = Vec<UpgradeRequestWithUser>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn list_requests(
    State(state): State<AppState>,
    _auth: RequireUpgradeReview,
    Query(query): Query<UpgradeRequestQuery>,
) -> Result<ApiResponse<Vec<UpgradeRequestWithUser>>, AppError> {
    let (requests, meta) = UpgradeRequestService::list(&state.db, query).await?;
    Ok(ApiResponse::paginated(requests, meta))
}

async fn review(
    state: AppState,
    auth: RequireUpgradeReview,
    id: UpgradeRequestId,
    decision: ReviewDecision,
    dto: ReviewUpgradeRequestDto,
) -> Result<PermissionUpgradeRequest, AppError> {
    let reviewer_id = auth.0.user_id()?;
    let request =
        UpgradeRequestService::review(&state.db, id, reviewer_id, decision, dto.note).await?;
    track_upgrade_request_reviewed(request.status.as_str());
    Ok(request)
}

/// Approve a pending request and grant the role
#[utoipa::path(
    post,
    path = "/api/admin/permission-upgrade-requests/{id}/approve",
    params(("id" = String, Path, description = "Upgrade request ID")),
    request_body = ReviewUpgradeRequestDto,
    responses(
        (status = 200, description = "Request approved", body = PermissionUpgradeRequest),
        (status = 400, description = "Request is not pending"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, dto))]
pub async fn approve_request(
    State(state): State<AppState>,
    auth: RequireUpgradeReview,
    ValidPath(id): ValidPath<UpgradeRequestId>,
    ValidatedJson(dto): ValidatedJson<ReviewUpgradeRequestDto>,
) -> Result<ApiResponse<PermissionUpgradeRequest>, AppError> {
    let request = review(state, auth, id, ReviewDecision::Approve, dto).await?;
    Ok(ApiResponse::ok(request).with_message("Upgrade request approved"))
}

#[utoipa::path(
    post,
    path = "/api/admin/permission-upgrade-requests/{id}/reject",
    params(("id" = String, Path, description = "Upgrade request ID")),
    request_body = ReviewUpgradeRequestDto,
    responses(
        (status = 200, description = "Request rejected", body = PermissionUpgradeRequest),
        (status = 400, description = "Request is not pending"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, dto))]
pub async fn reject_request(
    State(state): State<AppState>,
    auth: RequireUpgradeReview,
    ValidPath(id): ValidPath<UpgradeRequestId>,
    ValidatedJson(dto): ValidatedJson<ReviewUpgradeRequestDto>,
) -> Result<ApiResponse<PermissionUpgradeRequest>, AppError> {
    let request = review(state, auth, id, ReviewDecision::Reject, dto).await?;
    Ok(ApiResponse::ok(request).with_message("Upgrade request rejected"))
}
