use anyhow::anyhow;
use axum::extract::{Multipart, Query, State};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::FileUploadId;
use schoolboard_models::uploads::{FileUploadResponse, UploadListQuery};

use super::service::{IncomingFile, UploadService};
use crate::metrics::track_file_uploaded;
use crate::middleware::auth::RequireUploadsManage;
use crate::state::AppState;
use crate::validator::ValidPath;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), anyhow!(err.body_text()))
}

/// Reads the `file`, `relatedType` and `relatedId` parts. Other parts are
/// ignored.
async fn read_upload_form(mut multipart: Multipart) -> Result<IncomingFile, AppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut related_type: Option<String> = None;
    let mut related_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "upload".to_string());
                let mime_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, mime_type, bytes.to_vec()));
            }
            Some("relatedType") => {
                let text = field.text().await.map_err(multipart_error)?;
                related_type = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            Some("relatedId") => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    let id = text
                        .parse::<Uuid>()
                        .map_err(|_| AppError::bad_request(anyhow!("relatedId must be a UUID")))?;
                    related_id = Some(id);
                }
            }
            _ => {}
        }
    }

    let (original_filename, mime_type, bytes) =
        file.ok_or_else(|| AppError::bad_request(anyhow!("file is required")))?;
    let related_type =
        related_type.ok_or_else(|| AppError::bad_request(anyhow!("relatedType is required")))?;

    if bytes.is_empty() {
        return Err(AppError::bad_request(anyhow!("file is empty")));
    }

    Ok(IncomingFile {
        original_filename,
        mime_type,
        bytes,
        related_type,
        related_id,
    })
}

/// Upload a file (multipart: `file`, `relatedType`, optional `relatedId`)
#[utoipa::path(
    post,
    path = "/api/admin/uploads",
    request_body(content_type = "multipart/form-data", description = "file, relatedType, relatedId"),
    responses(
        (status = 201, description = "File stored", body = FileUploadResponse),
        (status = 400, description = "Missing or invalid form fields"),
        (status = 403, description = "Forbidden"),
        (status = 413, description = "File too large"),
        (status = 415, description = "File type not allowed")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    auth: RequireUploadsManage,
    multipart: Multipart,
) -> Result<(StatusCode, ApiResponse<FileUploadResponse>), AppError> {
    let uploaded_by = auth.0.user_id()?;
    let file = read_upload_form(multipart).await?;
    let size = file.bytes.len();

    let upload =
        UploadService::upload(&state.db, state.storage.as_ref(), file, uploaded_by).await?;
    track_file_uploaded(&upload.upload.related_type, size);

    Ok((StatusCode::CREATED, ApiResponse::ok(upload)))
}

#[utoipa::path(
    get,
    path = "/api/admin/uploads",
    params(UploadListQuery),
    responses(
        (status = 200, description = "Paginated uploads", body = Vec<FileUploadResponse>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn list_uploads(
    State(state): State<AppState>,
    _auth: RequireUploadsManage,
    Query(query): Query<UploadListQuery>,
) -> Result<ApiResponse<Vec<FileUploadResponse>>, AppError> {
    let (uploads, meta) = UploadService::list(&state.db, state.storage.as_ref(), query).await?;
    Ok(ApiResponse::paginated(uploads, meta))
}

#[utoipa::path(
    delete,
    path = "/api/admin/uploads/{id}",
    params(("id" = String, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "Upload deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn delete_upload(
    State(state): State<AppState>,
    _auth: RequireUploadsManage,
    ValidPath(id): ValidPath<FileUploadId>,
) -> Result<ApiResponse<()>, AppError> {
    UploadService::delete(&state.db, state.storage.as_ref(), id).await?;
    Ok(ApiResponse::ok(()).with_message("Upload deleted"))
}
