use axum::{
    Router,
    routing::{delete, get, post},
};

use super::controller::{approve_user, list_users, reject_user};
use crate::state::AppState;

/// Mounted under `/api/admin/users` behind `require_admin`.
pub fn init_admin_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}/approve", post(approve_user))
        .route("/{id}/reject", delete(reject_user))
}
