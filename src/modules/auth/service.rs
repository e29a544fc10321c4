use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use schoolboard_auth::{AccessTokenInput, TokenPair, create_token_pair, verify_refresh_token};
use schoolboard_config::JwtConfig;
use schoolboard_core::password::dummy_verify;
use schoolboard_core::{AppError, hash_password, verify_password};
use schoolboard_models::UserId;
use schoolboard_models::auth::{LoginRequest, RefreshStatus, RegisterRequest};
use schoolboard_models::users::{User, UserResponse};

use crate::metrics::{track_jwt_issued, track_user_login_failure, track_user_registered};
use crate::modules::roles::service::RoleService;
use crate::modules::users::service::{USER_COLUMNS, UserService};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A signed-in user, their current roles and a fresh token pair.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserResponse,
    pub roles: Vec<String>,
    pub tokens: TokenPair,
}

pub struct AuthService;

impl AuthService {
    /// Creates an inactive account with no roles. An admin approves it later.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn register(db: &PgPool, dto: RegisterRequest) -> Result<UserResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        if UserService::find_by_email(db, &email).await?.is_some() {
            return Err(AppError::conflict(anyhow!("Email is already registered")));
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_active)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&email)
        .bind(password_hash)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .fetch_one(db)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if duplicate {
                AppError::conflict(anyhow!("Email is already registered"))
            } else {
                AppError::database(anyhow::Error::from(e).context("Failed to insert user"))
            }
        })?;

        track_user_registered();
        info!(user_id = %user.id, "User registered, pending approval");
        Ok(UserResponse::from_user(user, Vec::new()))
    }

    /// Verifies credentials. Unknown emails still pay for a bcrypt check, and
    /// the inactive check only runs after the password matched.
    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<AuthSession, AppError> {
        let user = UserService::find_by_email(db, &dto.email).await?;

        let Some((user, hash)) = user.and_then(|u| {
            let hash = u.password_hash.clone()?;
            Some((u, hash))
        }) else {
            dummy_verify(&dto.password);
            track_user_login_failure("invalid_credentials");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&dto.password, &hash)? {
            track_user_login_failure("invalid_credentials");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if !user.is_active {
            warn!(user_id = %user.id, "Login refused for inactive account");
            track_user_login_failure("inactive");
            return Err(AppError::forbidden(
                "Account is pending approval or has been deactivated",
            ));
        }

        UserService::touch_last_login(db, user.id).await?;
        Self::issue_session(db, user, jwt_config).await
    }

    /// Loads the user's roles and signs a token pair for them.
    #[instrument(skip(db, user, jwt_config), fields(user_id = %user.id))]
    pub async fn issue_session(
        db: &PgPool,
        user: User,
        jwt_config: &JwtConfig,
    ) -> Result<AuthSession, AppError> {
        let roles = RoleService::role_names_for_user(db, user.id).await?;

        let tokens = create_token_pair(
            &AccessTokenInput {
                user_id: user.id.into_inner(),
                email: &user.email,
                first_name: &user.first_name,
                last_name: &user.last_name,
                roles: roles.clone(),
            },
            jwt_config,
        )?;
        track_jwt_issued();

        Ok(AuthSession {
            user: UserResponse::from_user(user, roles.clone()),
            roles,
            tokens,
        })
    }

    /// Resolves the active user a refresh token belongs to. `None` for any
    /// invalid, expired or orphaned token.
    async fn refresh_subject(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<Option<(User, usize)>, AppError> {
        let Ok(claims) = verify_refresh_token(refresh_token, jwt_config) else {
            return Ok(None);
        };
        let Some(user_id) = claims.user_id() else {
            return Ok(None);
        };

        let user = UserService::find_by_id(db, UserId::from_uuid(user_id)).await?;
        Ok(user.filter(|u| u.is_active).map(|u| (u, claims.exp)))
    }

    /// Rotates a refresh token into a new pair.
    #[instrument(skip_all)]
    pub async fn refresh_access_token(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<Option<AuthSession>, AppError> {
        match Self::refresh_subject(db, refresh_token, jwt_config).await? {
            Some((user, _)) => Self::issue_session(db, user, jwt_config).await.map(Some),
            None => Ok(None),
        }
    }

    /// Checks a refresh token without rotating it.
    #[instrument(skip_all)]
    pub async fn refresh_status(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<Option<RefreshStatus>, AppError> {
        let Some((user, exp)) = Self::refresh_subject(db, refresh_token, jwt_config).await? else {
            return Ok(None);
        };

        let roles = RoleService::role_names_for_user(db, user.id).await?;
        let expires_at = i64::try_from(exp)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .context("Refresh token expiry out of range")
            .map_err(AppError::internal)?;

        Ok(Some(RefreshStatus {
            valid: true,
            expires_at,
            user: UserResponse::from_user(user, roles),
        }))
    }

    #[instrument(skip(db))]
    pub async fn current_user(db: &PgPool, user_id: UserId) -> Result<UserResponse, AppError> {
        let user = UserService::find_by_id(db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;
        let roles = RoleService::role_names_for_user(db, user_id).await?;
        Ok(UserResponse::from_user(user, roles))
    }
}
