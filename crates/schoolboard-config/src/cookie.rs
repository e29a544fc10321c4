//! Session cookie attributes.
//!
//! - `APP_ENV=production` turns on the `Secure` attribute
//! - `COOKIE_SECURE` overrides that decision explicitly
//! - `COOKIE_DOMAIN` scopes cookies to a parent domain (unset: host-only)

use crate::{env_opt, env_or};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CookieConfig {
    pub secure: bool,
    pub domain: Option<String>,
}

impl CookieConfig {
    pub fn from_env() -> Self {
        let production = env_opt("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Self {
            secure: env_or("COOKIE_SECURE", production),
            domain: env_opt("COOKIE_DOMAIN"),
        }
    }

    pub fn production() -> Self {
        Self {
            secure: true,
            domain: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_insecure_host_only() {
        let config = CookieConfig::default();
        assert!(!config.secure);
        assert!(config.domain.is_none());
    }

    #[test]
    fn test_production() {
        assert!(CookieConfig::production().secure);
    }
}
