//! # SchoolBoard Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: token signing secret and lifetimes
//! - [`cookie`]: session cookie attributes
//! - [`cors`]: allowed origins for credentialed requests
//! - [`rate_limit`]: API rate limiting
//! - [`oauth`]: Google sign-in credentials
//! - [`storage`]: upload directory and limits
//! - [`server`]: bind address and ports
//!
//! # Example
//!
//! ```ignore
//! use schoolboard_config::{JwtConfig, CookieConfig, CorsConfig, RateLimitConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cookie_config = CookieConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

use std::str::FromStr;

pub mod cookie;
pub mod cors;
pub mod jwt;
pub mod oauth;
pub mod rate_limit;
pub mod server;
pub mod storage;

pub use cookie::CookieConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use oauth::{GoogleOAuthConfig, OAuthConfig};
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

/// Reads and parses an environment variable, falling back on absence or
/// parse failure.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Non-empty trimmed environment variable.
pub(crate) fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_missing_uses_default() {
        assert_eq!(env_or("SCHOOLBOARD_TEST_SURELY_UNSET_VAR", 42u16), 42);
    }

    #[test]
    fn test_env_opt_missing() {
        assert!(env_opt("SCHOOLBOARD_TEST_SURELY_UNSET_VAR").is_none());
    }
}
