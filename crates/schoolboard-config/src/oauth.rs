//! Google sign-in.
//!
//! Enabled only when `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` and
//! `GOOGLE_REDIRECT_URI` are all set.

use crate::env_opt;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OAuthConfig {
    pub google: Option<GoogleOAuthConfig>,
    /// Where the callback sends the browser when no redirect was stored.
    pub default_redirect: String,
}

impl OAuthConfig {
    pub fn from_env() -> Self {
        let google = match (
            env_opt("GOOGLE_CLIENT_ID"),
            env_opt("GOOGLE_CLIENT_SECRET"),
            env_opt("GOOGLE_REDIRECT_URI"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => None,
        };

        Self {
            google,
            default_redirect: env_opt("OAUTH_DEFAULT_REDIRECT").unwrap_or_else(|| "/".to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.google.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unconfigured() {
        assert!(!OAuthConfig::default().is_configured());
    }
}
