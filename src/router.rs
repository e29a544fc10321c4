use std::sync::Arc;

use anyhow::anyhow;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use schoolboard_config::rate_limit::IpGovernorConfig;
use schoolboard_core::AppError;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::role::require_admin;
use crate::modules::auth::init_auth_router;
use crate::modules::communications::init_communications_router;
use crate::modules::health::init_health_router;
use crate::modules::notifications::init_notifications_router;
use crate::modules::public::{init_parents_corner_router, init_public_router};
use crate::modules::roles::init_roles_router;
use crate::modules::settings::init_settings_router;
use crate::modules::upgrade_requests::{
    init_admin_upgrade_requests_router, init_upgrade_requests_router,
};
use crate::modules::uploads::init_uploads_router;
use crate::modules::users::init_admin_users_router;
use crate::state::AppState;

fn rate_limited(router: Router<AppState>, config: Option<IpGovernorConfig>) -> Router<AppState> {
    match config {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => router,
    }
}

/// CORS for the application API: listed origins only, cookies allowed.
fn credentialed_cors(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// CORS for the cacheable public endpoints: any origin, read-only, no cookies.
fn public_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

async fn not_found() -> AppError {
    AppError::not_found(anyhow!("Not found"))
}

fn api_router(state: &AppState) -> Router<AppState> {
    let auth = rate_limited(
        init_auth_router(),
        state.rate_limit_config.auth_governor_config(),
    );

    let api = Router::new()
        .nest("/auth", auth)
        .nest("/roles", init_roles_router())
        .nest("/v1/communications", init_communications_router())
        .nest("/notifications", init_notifications_router())
        .nest("/permission-upgrade-requests", init_upgrade_requests_router())
        .nest(
            "/admin/users",
            init_admin_users_router()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        .nest(
            "/admin/permission-upgrade-requests",
            init_admin_upgrade_requests_router(),
        )
        .nest(
            "/admin/uploads",
            init_uploads_router(state.storage_config.max_file_size),
        )
        .nest("/admin/settings", init_settings_router())
        .nest("/health", init_health_router());

    rate_limited(api, state.rate_limit_config.general_governor_config())
        .layer(credentialed_cors(state))
}

fn public_router() -> Router<AppState> {
    Router::new()
        .nest("/api/public", init_public_router())
        .nest("/api/parents-corner", init_parents_corner_router())
        .layer(public_cors())
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api_router(&state))
        .merge(public_router())
        .nest_service("/uploads", ServeDir::new(&state.storage_config.upload_dir))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
