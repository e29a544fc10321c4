use axum::{
    Router,
    routing::{get, put},
};

use super::controller::{delete_setting, list_settings, upsert_setting};
use crate::state::AppState;

pub fn init_settings_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings))
        .route("/{key}", put(upsert_setting).delete(delete_setting))
}
