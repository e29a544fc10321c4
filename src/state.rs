use std::sync::Arc;
use std::time::Duration;

use schoolboard_config::{
    CookieConfig, CorsConfig, JwtConfig, OAuthConfig, RateLimitConfig, StorageConfig,
};
use schoolboard_core::file_storage::{FileStorage, LocalFileStorage};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cookie_config: CookieConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub oauth_config: OAuthConfig,
    pub storage_config: StorageConfig,
    pub storage: Arc<dyn FileStorage>,
    /// Outbound client for the Google code exchange.
    pub http_client: reqwest::Client,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &"<redacted>")
            .field("cookie_config", &self.cookie_config)
            .field("cors_config", &self.cors_config)
            .field("rate_limit_config", &self.rate_limit_config)
            .field("storage_config", &self.storage_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Builds the state around an existing pool, reading every other
    /// setting from the environment.
    pub fn from_env(db: PgPool) -> Self {
        let storage_config = StorageConfig::from_env();
        let storage = LocalFileStorage::with_max_size(
            storage_config.upload_dir.clone(),
            storage_config.base_url.clone(),
            storage_config.max_file_size,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            cookie_config: CookieConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
            oauth_config: OAuthConfig::from_env(),
            storage_config,
            storage: Arc::new(storage),
            http_client,
        }
    }
}

pub async fn init_app_state() -> Result<AppState, sqlx::Error> {
    let db = schoolboard_db::init_db_pool().await?;
    Ok(AppState::from_env(db))
}
