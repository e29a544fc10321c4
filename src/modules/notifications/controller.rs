use axum::extract::State;
use tracing::instrument;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::notifications::{
    NotificationPreference, UpdateNotificationPreferencesDto,
};

use super::service::NotificationService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/notifications/preferences",
    responses(
        (status = 200, description = "Current preferences", body = NotificationPreference),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<NotificationPreference>, AppError> {
    let prefs = NotificationService::get_preferences(&state.db, auth_user.user_id()?).await?;
    Ok(ApiResponse::ok(prefs))
}

/// Save preferences; omitted fields keep their current value
#[utoipa::path(
    put,
    path = "/api/notifications/preferences",
    request_body = UpdateNotificationPreferencesDto,
    responses(
        (status = 200, description = "Preferences saved", body = NotificationPreference),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_preferences(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateNotificationPreferencesDto>,
) -> Result<ApiResponse<NotificationPreference>, AppError> {
    let prefs =
        NotificationService::update_preferences(&state.db, auth_user.user_id()?, dto).await?;
    Ok(ApiResponse::ok(prefs).with_message("Preferences saved"))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/preferences",
    responses(
        (status = 200, description = "Preferences reset to defaults", body = NotificationPreference),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reset_preferences(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<NotificationPreference>, AppError> {
    let prefs = NotificationService::reset_preferences(&state.db, auth_user.user_id()?).await?;
    Ok(ApiResponse::ok(prefs).with_message("Preferences reset"))
}
