use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    google_callback, google_redirect, google_url, login, logout, me, refresh, refresh_status,
    register,
};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh).get(refresh_status))
        .route("/me", get(me))
        .route("/google", get(google_redirect).post(google_url))
        .route("/google/callback", get(google_callback))
}
