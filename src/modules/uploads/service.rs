use anyhow::{Context, anyhow};
use axum::http::StatusCode;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use schoolboard_core::file_storage::{FileStorage, StorageError, generate_key};
use schoolboard_core::{AppError, PaginationMeta};
use schoolboard_models::uploads::{
    FileUpload, FileUploadResponse, UploadListQuery, is_valid_related_type,
};
use schoolboard_models::{FileUploadId, UserId};

const UPLOAD_COLUMNS: &str = "id, stored_filename, original_filename, path, size_bytes, mime_type, \
     related_type, related_id, uploaded_by, created_at";

/// A file received from a client, not yet stored.
#[derive(Debug)]
pub struct IncomingFile {
    pub original_filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub related_type: String,
    pub related_id: Option<Uuid>,
}

pub fn storage_error(err: StorageError) -> AppError {
    if err.is_client_error() {
        let status = match err {
            StorageError::InvalidFileSize { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            StorageError::InvalidMimeType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        AppError::new(status, err)
    } else {
        AppError::internal(err)
    }
}

fn with_url(storage: &dyn FileStorage, upload: FileUpload) -> Result<FileUploadResponse, AppError> {
    let url = storage.get_url(&upload.path).map_err(storage_error)?;
    Ok(FileUploadResponse { upload, url })
}

fn push_upload_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &UploadListQuery) {
    if let Some(related_type) = &query.related_type {
        builder
            .push(" AND related_type = ")
            .push_bind(related_type.clone());
    }
    if let Some(related_id) = query.related_id {
        builder.push(" AND related_id = ").push_bind(related_id);
    }
}

pub struct UploadService;

impl UploadService {
    /// Writes the file through `storage` and records it. The file is removed
    /// again if the row cannot be inserted.
    #[instrument(
        skip(db, storage, file),
        fields(file.size = file.bytes.len(), related_type = %file.related_type)
    )]
    pub async fn upload(
        db: &PgPool,
        storage: &dyn FileStorage,
        file: IncomingFile,
        uploaded_by: UserId,
    ) -> Result<FileUploadResponse, AppError> {
        if !is_valid_related_type(&file.related_type) {
            return Err(AppError::bad_request(anyhow!(
                "relatedType must be lowercase letters, digits or underscores"
            )));
        }

        let key = generate_key(&file.related_type, &file.original_filename);
        let key = storage
            .save(&key, &file.bytes, &file.mime_type)
            .await
            .map_err(storage_error)?;

        let stored_filename = key.rsplit('/').next().unwrap_or(&key).to_string();
        let size_bytes = i64::try_from(file.bytes.len())
            .context("File size out of range")
            .map_err(AppError::internal)?;

        let inserted = sqlx::query_as::<_, FileUpload>(&format!(
            "INSERT INTO file_uploads (stored_filename, original_filename, path, size_bytes, \
             mime_type, related_type, related_id, uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {UPLOAD_COLUMNS}"
        ))
        .bind(&stored_filename)
        .bind(&file.original_filename)
        .bind(&key)
        .bind(size_bytes)
        .bind(&file.mime_type)
        .bind(&file.related_type)
        .bind(file.related_id)
        .bind(uploaded_by)
        .fetch_one(db)
        .await;

        let upload = match inserted {
            Ok(upload) => upload,
            Err(e) => {
                if let Err(cleanup) = storage.delete(&key).await {
                    warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(AppError::database(
                    anyhow::Error::from(e).context("Failed to record upload"),
                ));
            }
        };

        info!(upload_id = %upload.id, key = %key, "File uploaded");
        with_url(storage, upload)
    }

    #[instrument(skip(db, storage))]
    pub async fn list(
        db: &PgPool,
        storage: &dyn FileStorage,
        query: UploadListQuery,
    ) -> Result<(Vec<FileUploadResponse>, PaginationMeta), AppError> {
        let pagination = query.pagination();

        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM file_uploads WHERE 1=1");
        push_upload_filters(&mut count_builder, &query);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count uploads")
            .map_err(AppError::database)?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {UPLOAD_COLUMNS} FROM file_uploads WHERE 1=1"
        ));
        push_upload_filters(&mut builder, &query);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let uploads = builder
            .build_query_as::<FileUpload>()
            .fetch_all(db)
            .await
            .context("Failed to fetch uploads")
            .map_err(AppError::database)?;

        let uploads = uploads
            .into_iter()
            .map(|upload| with_url(storage, upload))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((uploads, pagination.meta(total)))
    }

    /// Removes the row, then the file. A file that cannot be deleted is
    /// logged and left behind.
    #[instrument(skip(db, storage))]
    pub async fn delete(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: FileUploadId,
    ) -> Result<(), AppError> {
        let path: String =
            sqlx::query_scalar("DELETE FROM file_uploads WHERE id = $1 RETURNING path")
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to delete upload")
                .map_err(AppError::database)?
                .ok_or_else(|| AppError::not_found(anyhow!("Upload not found")))?;

        if let Err(err) = storage.delete(&path).await {
            error!(upload_id = %id, path = %path, error = %err, "Failed to delete stored file");
        }

        info!(upload_id = %id, "Upload deleted");
        Ok(())
    }
}
