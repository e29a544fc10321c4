use anyhow::anyhow;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use schoolboard_auth::cookies::{
    OAUTH_REDIRECT_COOKIE, OAUTH_STATE_COOKIE, REFRESH_COOKIE, AUTH_COOKIE, clear_oauth_cookies,
    clear_session_cookies, sanitize_redirect, set_oauth_cookies, set_session_cookies,
};
use schoolboard_config::GoogleOAuthConfig;
use schoolboard_core::{ApiResponse, AppError, RoleName};
use schoolboard_models::auth::{
    GoogleAuthQuery, GoogleCallbackQuery, LoginRequest, LoginResponse, OAuthUrlResponse,
    RefreshStatus, RegisterRequest,
};
use schoolboard_models::users::UserResponse;

use super::google::{GoogleOAuthService, authorize_url, generate_state};
use super::service::{AuthService, AuthSession};
use crate::metrics::{track_token_refresh, track_user_login_success};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

const INVALID_TOKEN: &str = "Invalid or expired token";

fn google_config(state: &AppState) -> Result<&GoogleOAuthConfig, AppError> {
    state
        .oauth_config
        .google
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable(anyhow!("Google sign-in is not configured")))
}

fn login_response(session: &AuthSession) -> LoginResponse {
    LoginResponse {
        user: session.user.clone(),
        roles: session.roles.clone(),
    }
}

fn role_label(roles: &[String]) -> &'static str {
    RoleName::highest(roles.iter().map(String::as_str))
        .map(|r| r.as_str())
        .unwrap_or("none")
}

/// Register a new account (inactive until an admin approves it)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, pending approval", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<UserResponse>), AppError> {
    let user = AuthService::register(&state.db, dto).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(user).with_message("Registration received. An administrator will review your account."),
    ))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookies set", body = LoginResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account inactive")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    let session = AuthService::login(&state.db, dto, &state.jwt_config).await?;
    track_user_login_success(role_label(&session.roles));

    let body = login_response(&session);
    let jar = set_session_cookies(jar, session.tokens, &state.jwt_config, &state.cookie_config);
    Ok((jar, ApiResponse::ok(body)))
}

/// Clear the session cookies
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "No session present")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<()>), AppError> {
    if jar.get(AUTH_COOKIE).is_none() && jar.get(REFRESH_COOKIE).is_none() {
        return Err(AppError::unauthorized("No active session"));
    }

    let jar = clear_session_cookies(jar, &state.cookie_config);
    Ok((jar, ApiResponse::ok(()).with_message("Logged out")))
}

/// Rotate the refresh cookie into a new session
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New session cookies set", body = LoginResponse),
        (status = 401, description = "Missing, invalid or expired refresh token")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::unauthorized(INVALID_TOKEN))?;

    let Some(session) =
        AuthService::refresh_access_token(&state.db, &token, &state.jwt_config).await?
    else {
        track_token_refresh(false);
        return Err(AppError::unauthorized(INVALID_TOKEN));
    };
    track_token_refresh(true);

    let body = login_response(&session);
    let jar = set_session_cookies(jar, session.tokens, &state.jwt_config, &state.cookie_config);
    Ok((jar, ApiResponse::ok(body)))
}

/// Check the refresh cookie without rotating it
#[utoipa::path(
    get,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Refresh token is valid", body = RefreshStatus),
        (status = 401, description = "Missing, invalid or expired refresh token")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh_status(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<ApiResponse<RefreshStatus>, AppError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::unauthorized(INVALID_TOKEN))?;

    AuthService::refresh_status(&state.db, &token, &state.jwt_config)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::unauthorized(INVALID_TOKEN))
}

/// The signed-in user with their current roles
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = AuthService::current_user(&state.db, auth_user.user_id()?).await?;
    Ok(ApiResponse::ok(user))
}

fn start_google_flow(
    state: &AppState,
    jar: CookieJar,
    redirect: Option<&str>,
) -> Result<(CookieJar, String), AppError> {
    let config = google_config(state)?;
    let csrf_state = generate_state();
    let url = authorize_url(config, &csrf_state)?;

    let jar = set_oauth_cookies(
        jar,
        csrf_state,
        sanitize_redirect(redirect),
        &state.cookie_config,
    );
    Ok((jar, url))
}

/// Redirect to Google's consent screen
#[utoipa::path(
    get,
    path = "/api/auth/google",
    params(GoogleAuthQuery),
    responses(
        (status = 307, description = "Redirect to Google"),
        (status = 503, description = "Google sign-in not configured")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar))]
pub async fn google_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<GoogleAuthQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    let (jar, url) = start_google_flow(&state, jar, query.redirect.as_deref())?;
    Ok((jar, Redirect::temporary(&url)))
}

/// Start Google sign-in and return the consent URL
#[utoipa::path(
    post,
    path = "/api/auth/google",
    params(GoogleAuthQuery),
    responses(
        (status = 200, description = "Consent URL", body = OAuthUrlResponse),
        (status = 503, description = "Google sign-in not configured")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar))]
pub async fn google_url(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<GoogleAuthQuery>,
) -> Result<(CookieJar, ApiResponse<OAuthUrlResponse>), AppError> {
    let (jar, url) = start_google_flow(&state, jar, query.redirect.as_deref())?;
    Ok((jar, ApiResponse::ok(OAuthUrlResponse { url })))
}

/// Google redirects here after consent
#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    params(GoogleCallbackQuery),
    responses(
        (status = 307, description = "Signed in; redirect to the stored path"),
        (status = 400, description = "State mismatch or missing code"),
        (status = 403, description = "No active account for this Google address"),
        (status = 503, description = "Google sign-in not configured")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    let config = google_config(&state)?;

    if let Some(error) = query.error.as_deref() {
        warn!(error, "Google sign-in was not completed");
        return Err(AppError::bad_request(anyhow!("Google sign-in was cancelled")));
    }

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(received)) if !expected.is_empty() && expected == received => {}
        _ => return Err(AppError::bad_request(anyhow!("Invalid OAuth state"))),
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request(anyhow!("Missing authorization code")))?;

    let redirect = jar
        .get(OAUTH_REDIRECT_COOKIE)
        .map(|c| sanitize_redirect(Some(c.value())))
        .unwrap_or_else(|| sanitize_redirect(Some(&state.oauth_config.default_redirect)));

    let profile = GoogleOAuthService::exchange_code(&state.http_client, config, code).await?;
    let user = GoogleOAuthService::resolve_user(&state.db, &profile).await?;
    let session = AuthService::issue_session(&state.db, user, &state.jwt_config).await?;

    info!(user_id = %session.user.id, "Signed in with Google");
    track_user_login_success(role_label(&session.roles));

    let jar = clear_oauth_cookies(jar, &state.cookie_config);
    let jar = set_session_cookies(jar, session.tokens, &state.jwt_config, &state.cookie_config);
    Ok((jar, Redirect::temporary(&redirect)))
}
