use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get},
};

use super::controller::{delete_upload, list_uploads, upload_file};
use crate::state::AppState;

/// Multipart overhead allowed on top of the largest accepted file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn init_uploads_router(max_file_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_uploads)
                .post(upload_file)
                .layer(DefaultBodyLimit::max(max_file_size + FORM_OVERHEAD_BYTES)),
        )
        .route("/{id}", delete(delete_upload))
}
