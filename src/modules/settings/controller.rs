use axum::extract::{Path, State};
use tracing::instrument;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::settings::{SystemSetting, UpsertSettingDto};

use super::service::SettingsService;
use crate::middleware::auth::RequireSettingsManage;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "All settings", body = Vec<SystemSetting>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn list_settings(
    State(state): State<AppState>,
    _auth: RequireSettingsManage,
) -> Result<ApiResponse<Vec<SystemSetting>>, AppError> {
    Ok(ApiResponse::ok(SettingsService::list(&state.db).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings/{key}",
    params(("key" = String, Path, description = "Setting key, e.g. school.name")),
    request_body = UpsertSettingDto,
    responses(
        (status = 200, description = "Setting saved", body = SystemSetting),
        (status = 400, description = "Invalid key or body"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, dto))]
pub async fn upsert_setting(
    State(state): State<AppState>,
    auth: RequireSettingsManage,
    Path(key): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpsertSettingDto>,
) -> Result<ApiResponse<SystemSetting>, AppError> {
    let setting = SettingsService::upsert(&state.db, &key, dto, auth.0.user_id()?).await?;
    Ok(ApiResponse::ok(setting))
}

#[utoipa::path(
    delete,
    path = "/api/admin/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn delete_setting(
    State(state): State<AppState>,
    _auth: RequireSettingsManage,
    Path(key): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    SettingsService::delete(&state.db, &key).await?;
    Ok(ApiResponse::ok(()).with_message("Setting deleted"))
}
