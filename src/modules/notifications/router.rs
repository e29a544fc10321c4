use axum::{Router, routing::get};

use super::controller::{get_preferences, reset_preferences, update_preferences};
use crate::state::AppState;

pub fn init_notifications_router() -> Router<AppState> {
    Router::new().route(
        "/preferences",
        get(get_preferences)
            .put(update_preferences)
            .delete(reset_preferences),
    )
}
