//! Google sign-in.
//!
//! The CSRF state and the post-login redirect travel only in short-lived
//! cookies, so the callback must reach the same deployment that issued
//! them.

use anyhow::Context;
use rand::{Rng, distributions::Alphanumeric};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use schoolboard_config::GoogleOAuthConfig;
use schoolboard_config::oauth::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL};
use schoolboard_core::AppError;
use schoolboard_models::auth::{Account, GoogleProfile, GoogleTokenResponse};
use schoolboard_models::users::User;

use crate::modules::users::service::UserService;

pub const GOOGLE_PROVIDER: &str = "google";

const STATE_LENGTH: usize = 43;

pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Consent screen URL carrying `state`.
pub fn authorize_url(config: &GoogleOAuthConfig, state: &str) -> Result<String, AppError> {
    let url = reqwest::Url::parse_with_params(
        GOOGLE_AUTH_URL,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
            ("access_type", "online"),
            ("prompt", "select_account"),
        ],
    )
    .context("Failed to build Google authorization URL")
    .map_err(AppError::internal)?;

    Ok(url.into())
}

pub struct GoogleOAuthService;

impl GoogleOAuthService {
    /// Trades the authorization code for the caller's Google profile.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        client: &reqwest::Client,
        config: &GoogleOAuthConfig,
        code: &str,
    ) -> Result<GoogleProfile, AppError> {
        let token = client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Google token request failed")
            .map_err(AppError::internal)?;

        if !token.status().is_success() {
            warn!(status = %token.status(), "Google rejected the authorization code");
            return Err(AppError::unauthorized("Google sign-in failed"));
        }

        let token: GoogleTokenResponse = token
            .json()
            .await
            .context("Malformed Google token response")
            .map_err(AppError::internal)?;

        client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("Google userinfo request failed")
            .map_err(AppError::internal)?
            .json::<GoogleProfile>()
            .await
            .context("Malformed Google profile")
            .map_err(AppError::internal)
    }

    /// Finds the local user for a Google profile, linking the account on
    /// first use. Only existing, active users may sign in this way.
    #[instrument(skip(db, profile), fields(email = %profile.email))]
    pub async fn resolve_user(db: &PgPool, profile: &GoogleProfile) -> Result<User, AppError> {
        if !profile.email_verified {
            return Err(AppError::forbidden("Google email address is not verified"));
        }

        let linked = sqlx::query_as::<_, Account>(
            r#"
            SELECT user_id, provider, provider_account_id
            FROM accounts
            WHERE provider = $1 AND provider_account_id = $2
            "#,
        )
        .bind(GOOGLE_PROVIDER)
        .bind(&profile.sub)
        .fetch_optional(db)
        .await
        .context("Failed to look up linked account")
        .map_err(AppError::database)?;

        let user = match linked {
            Some(account) => UserService::find_by_id(db, account.user_id).await?,
            None => {
                let user = UserService::find_by_email(db, &profile.email).await?;
                if let Some(user) = &user {
                    Self::link_account(db, user, &profile.sub).await?;
                }
                user
            }
        };

        let user = user.ok_or_else(|| {
            AppError::forbidden("No account is registered for this Google address")
        })?;

        if !user.is_active {
            return Err(AppError::forbidden(
                "Account is pending approval or has been deactivated",
            ));
        }

        UserService::touch_last_login(db, user.id).await?;
        Ok(user)
    }

    async fn link_account(db: &PgPool, user: &User, subject: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (user_id, provider, provider_account_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, provider_account_id) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(GOOGLE_PROVIDER)
        .bind(subject)
        .execute(db)
        .await
        .context("Failed to link Google account")
        .map_err(AppError::database)?;

        info!(user_id = %user.id, "Linked Google account");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/api/auth/google/callback".to_string(),
        }
    }

    #[test]
    fn test_generate_state_is_random_alphanumeric() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_authorize_url_carries_state_and_client() {
        let url = authorize_url(&config(), "abc123").unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
    }
}
