use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use schoolboard_auth::cookies::AUTH_COOKIE;
use schoolboard_auth::{Claims, verify_token};
use schoolboard_core::{AppError, Permission};
use schoolboard_models::UserId;

use crate::state::AppState;

/// Extractor that resolves the caller from a bearer token or the
/// `auth-token` cookie. Rejects with 401 when neither is valid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0.user_id().map(UserId::from_uuid)
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    /// Role names as of token issue. Authorization re-reads them from the
    /// database instead.
    pub fn token_roles(&self) -> &[String] {
        &self.0.roles
    }
}

/// Bearer header wins over the cookie when both are sent.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        let claims = verify_token(&token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Generates an extractor that authenticates the caller and then checks a
/// [`Permission`](schoolboard_core::Permission) against the database.
/// Lookup failures deny.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = schoolboard_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;

                $crate::middleware::role::ensure_permission(&state.db, &auth_user, $permission)
                    .await?;

                Ok($name(auth_user))
            }
        }
    };
}

require_permission!(RequireAdmin, Permission::ManageUsers);
require_permission!(RequireOfficeMember, Permission::AccessAdminPanel);
require_permission!(RequireCommunicationsRead, Permission::ViewCommunications);
require_permission!(RequireCommunicationsManage, Permission::ManageCommunications);
require_permission!(RequireUpgradeReview, Permission::ReviewUpgradeRequests);
require_permission!(RequireSettingsManage, Permission::ManageSettings);
require_permission!(RequireUploadsManage, Permission::ManageUploads);
