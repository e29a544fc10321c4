use axum::{Router, routing::get};

use schoolboard_core::cache_control::{CacheControlConfig, cache_control};

use super::controller::{parents_corner_carousel, public_announcements, public_info};
use crate::state::AppState;

fn shared_cache(s_maxage: u64, stale_while_revalidate: u64) -> CacheControlConfig {
    CacheControlConfig::public(0)
        .with_s_maxage(s_maxage)
        .with_stale_while_revalidate(stale_while_revalidate)
}

/// Mounted at `/api/public`.
pub fn init_public_router() -> Router<AppState> {
    Router::new()
        .route(
            "/announcements",
            get(public_announcements).layer(cache_control(shared_cache(60, 300))),
        )
        .route(
            "/info",
            get(public_info).layer(cache_control(shared_cache(3600, 86400))),
        )
}

/// Mounted at `/api/parents-corner`.
pub fn init_parents_corner_router() -> Router<AppState> {
    Router::new().route(
        "/carousel",
        get(parents_corner_carousel).layer(cache_control(shared_cache(300, 3600))),
    )
}
