use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::CommunicationId;
use schoolboard_models::communications::{
    Communication, CommunicationQuery, CreateCommunicationDto, UpdateCommunicationDto, Visibility,
};

use super::service::CommunicationService;
use crate::metrics::track_communication_created;
use crate::middleware::auth::{RequireCommunicationsManage, RequireCommunicationsRead};
use crate::middleware::role::effective_role;
use crate::state::AppState;
use crate::validator::{ValidPath, ValidatedJson};

async fn visibility_for(
    state: &AppState,
    auth: &RequireCommunicationsRead,
) -> Result<Visibility, AppError> {
    let role = effective_role(&state.db, &auth.0).await?;
    Ok(Visibility::for_role(role))
}

/// List announcements, messages, reminders and newsletters
///
/// Admins and office members see every record. Other readers see published,
/// live records aimed at their audience.
#[utoipa::path(
    get,
    path = "/api/v1/communications",
    params(CommunicationQuery),
    responses(
        (status = 200, description = "Paginated communications", body = Vec<Communication>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Communications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth))]
pub async fn list_communications(
    State(state): State<AppState>,
    auth: RequireCommunicationsRead,
    Query(query): Query<CommunicationQuery>,
) -> Result<ApiResponse<Vec<Communication>>, AppError> {
    let visibility = visibility_for(&state, &auth).await?;
    let (items, meta) = CommunicationService::list(&state.db, query.into_filter(visibility)).await?;
    Ok(ApiResponse::paginated(items, meta))
}

/// Create a communication
#[utoipa::path(
    post,
    path = "/api/v1/communications",
    request_body = CreateCommunicationDto,
    responses(
        (status = 201, description = "Communication created", body = Communication),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Communications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, dto))]
pub async fn create_communication(
    State(state): State<AppState>,
    auth: RequireCommunicationsManage,
    ValidatedJson(dto): ValidatedJson<CreateCommunicationDto>,
) -> Result<(StatusCode, ApiResponse<Communication>), AppError> {
    let author_id = auth.0.user_id()?;
    let communication = CommunicationService::create(&state.db, dto, author_id).await?;
    track_communication_created(communication.communication_type.as_str());
    Ok((StatusCode::CREATED, ApiResponse::ok(communication)))
}

#[utoipa::path(
    get,
    path = "/api/v1/communications/{id}",
    params(("id" = String, Path, description = "Communication ID")),
    responses(
        (status = 200, description = "Communication", body = Communication),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not visible")
    ),
    tag = "Communications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth))]
pub async fn get_communication(
    State(state): State<AppState>,
    auth: RequireCommunicationsRead,
    ValidPath(id): ValidPath<CommunicationId>,
) -> Result<ApiResponse<Communication>, AppError> {
    let visibility = visibility_for(&state, &auth).await?;
    CommunicationService::find_visible(&state.db, id, &visibility)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Communication not found")))
}

/// Update selected fields of a communication
#[utoipa::path(
    patch,
    path = "/api/v1/communications/{id}",
    params(("id" = String, Path, description = "Communication ID")),
    request_body = UpdateCommunicationDto,
    responses(
        (status = 200, description = "Communication updated", body = Communication),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    tag = "Communications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn update_communication(
    State(state): State<AppState>,
    _auth: RequireCommunicationsManage,
    ValidPath(id): ValidPath<CommunicationId>,
    ValidatedJson(dto): ValidatedJson<UpdateCommunicationDto>,
) -> Result<ApiResponse<Communication>, AppError> {
    let communication = CommunicationService::update(&state.db, id, dto).await?;
    Ok(ApiResponse::ok(communication))
}

#[utoipa::path(
    delete,
    path = "/api/v1/communications/{id}",
    params(("id" = String, Path, description = "Communication ID")),
    responses(
        (status = 200, description = "Communication deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    tag = "Communications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn delete_communication(
    State(state): State<AppState>,
    _auth: RequireCommunicationsManage,
    ValidPath(id): ValidPath<CommunicationId>,
) -> Result<ApiResponse<()>, AppError> {
    CommunicationService::delete(&state.db, id).await?;
    Ok(ApiResponse::ok(()).with_message("Communication deleted"))
}
