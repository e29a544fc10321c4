//! Session and OAuth cookies.
//!
//! | name             | contents                    | max-age              |
//! |------------------|-----------------------------|----------------------|
//! | `auth-token`     | access JWT                  | access token expiry  |
//! | `refresh-token`  | refresh JWT                 | refresh token expiry |
//! | `oauth-state`    | random CSRF state           | 10 minutes           |
//! | `oauth-redirect` | relative path after sign-in | 10 minutes           |
//!
//! All are http-only, `SameSite=Lax`, `Path=/`, and `Secure` when the
//! cookie config says so.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use schoolboard_config::{CookieConfig, JwtConfig};

use crate::jwt::TokenPair;

pub const AUTH_COOKIE: &str = "auth-token";
pub const REFRESH_COOKIE: &str = "refresh-token";
pub const OAUTH_STATE_COOKIE: &str = "oauth-state";
pub const OAUTH_REDIRECT_COOKIE: &str = "oauth-redirect";

pub const OAUTH_COOKIE_MAX_AGE: i64 = 600;

fn build_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    config: &CookieConfig,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age);

    if let Some(domain) = &config.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// Empty cookie with identical attributes that expires immediately.
fn expired_cookie(name: &'static str, config: &CookieConfig) -> Cookie<'static> {
    let mut cookie = build_cookie(name, String::new(), Duration::ZERO, config);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}

pub fn auth_cookie(token: String, jwt: &JwtConfig, config: &CookieConfig) -> Cookie<'static> {
    build_cookie(
        AUTH_COOKIE,
        token,
        Duration::seconds(jwt.access_token_expiry),
        config,
    )
}

pub fn refresh_cookie(token: String, jwt: &JwtConfig, config: &CookieConfig) -> Cookie<'static> {
    build_cookie(
        REFRESH_COOKIE,
        token,
        Duration::seconds(jwt.refresh_token_expiry),
        config,
    )
}

pub fn set_session_cookies(
    jar: CookieJar,
    tokens: TokenPair,
    jwt: &JwtConfig,
    config: &CookieConfig,
) -> CookieJar {
    jar.add(auth_cookie(tokens.access_token, jwt, config))
        .add(refresh_cookie(tokens.refresh_token, jwt, config))
}

pub fn clear_session_cookies(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    jar.add(expired_cookie(AUTH_COOKIE, config))
        .add(expired_cookie(REFRESH_COOKIE, config))
}

pub fn set_oauth_cookies(
    jar: CookieJar,
    state: String,
    redirect: String,
    config: &CookieConfig,
) -> CookieJar {
    let max_age = Duration::seconds(OAUTH_COOKIE_MAX_AGE);
    jar.add(build_cookie(OAUTH_STATE_COOKIE, state, max_age, config))
        .add(build_cookie(OAUTH_REDIRECT_COOKIE, redirect, max_age, config))
}

pub fn clear_oauth_cookies(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    jar.add(expired_cookie(OAUTH_STATE_COOKIE, config))
        .add(expired_cookie(OAUTH_REDIRECT_COOKIE, config))
}

/// Reduces a requested post-login destination to a same-site relative path.
///
/// Absolute URLs, protocol-relative `//host` forms and backslash tricks all
/// fall back to `/`.
pub fn sanitize_redirect(raw: Option<&str>) -> String {
    let Some(path) = raw.map(str::trim).filter(|p| !p.is_empty()) else {
        return "/".to_string();
    };

    let safe = path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control);

    if safe { path.to_string() } else { "/".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-testing-purposes-only".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604_800,
        }
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie("tok".to_string(), &jwt(), &CookieConfig::production());
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));
    }

    #[test]
    fn test_refresh_cookie_lifetime() {
        let cookie = refresh_cookie("r".to_string(), &jwt(), &CookieConfig::default());
        assert_eq!(cookie.max_age(), Some(Duration::seconds(604_800)));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_domain_applied() {
        let config = CookieConfig {
            secure: true,
            domain: Some("school.example".to_string()),
        };
        let cookie = auth_cookie("t".to_string(), &jwt(), &config);
        assert_eq!(cookie.domain(), Some("school.example"));
    }

    #[test]
    fn test_session_cookies_set_and_cleared() {
        let config = CookieConfig::default();
        let jar = set_session_cookies(
            CookieJar::new(),
            TokenPair {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
            },
            &jwt(),
            &config,
        );
        assert_eq!(jar.get(AUTH_COOKIE).map(|c| c.value()), Some("a"));
        assert_eq!(jar.get(REFRESH_COOKIE).map(|c| c.value()), Some("r"));

        let jar = clear_session_cookies(jar, &config);
        let cleared = jar.get(AUTH_COOKIE).unwrap();
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(Duration::ZERO));
        assert_eq!(cleared.http_only(), Some(true));
    }

    #[test]
    fn test_oauth_cookies_ten_minutes() {
        let jar = set_oauth_cookies(
            CookieJar::new(),
            "state".to_string(),
            "/dashboard".to_string(),
            &CookieConfig::default(),
        );
        let state = jar.get(OAUTH_STATE_COOKIE).unwrap();
        assert_eq!(state.max_age(), Some(Duration::minutes(10)));
        assert_eq!(state.http_only(), Some(true));
        assert_eq!(
            jar.get(OAUTH_REDIRECT_COOKIE).map(|c| c.value()),
            Some("/dashboard")
        );
    }

    #[test]
    fn test_sanitize_redirect() {
        assert_eq!(sanitize_redirect(Some("/parents/notices?x=1")), "/parents/notices?x=1");
        assert_eq!(sanitize_redirect(Some("https://evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("//evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("/\\evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("")), "/");
        assert_eq!(sanitize_redirect(None), "/");
    }
}
