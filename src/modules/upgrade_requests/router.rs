use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{approve_request, create_request, list_requests, my_requests, reject_request};
use crate::state::AppState;

/// Mounted at `/api/permission-upgrade-requests`.
pub fn init_upgrade_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request))
        .route("/mine", get(my_requests))
}

/// Mounted at `/api/admin/permission-upgrade-requests`.
pub fn init_admin_upgrade_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests))
        .route("/{id}/approve", post(approve_request))
        .route("/{id}/reject", post(reject_request))
}
