use anyhow::{Context, anyhow};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use schoolboard_core::query::like_pattern;
use schoolboard_core::{AppError, PaginationMeta, RoleName};
use schoolboard_models::UserId;
use schoolboard_models::users::{
    RejectedUser, User, UserListQuery, UserResponse, UserStatusFilter, UserWithRolesRow,
};

use crate::modules::roles::service::RoleService;

pub const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, is_active, last_login_at, created_at, updated_at";

pub struct UserService;

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &UserListQuery) {
    match query.status {
        Some(UserStatusFilter::Pending) => {
            builder.push(" AND u.is_active = FALSE");
        }
        Some(UserStatusFilter::Active) => {
            builder.push(" AND u.is_active = TRUE");
        }
        None => {}
    }

    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl UserService {
    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch user by ID")
            .map_err(AppError::database)
    }

    /// Emails are stored lowercase; the lookup normalizes its input the same way.
    #[instrument(skip(db))]
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(db)
            .await
            .context("Failed to fetch user by email")
            .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn touch_last_login(db: &PgPool, id: UserId) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to record login")
            .map_err(AppError::database)?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        query: UserListQuery,
    ) -> Result<(Vec<UserResponse>, PaginationMeta), AppError> {
        let pagination = query.pagination();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE 1=1");
        push_user_filters(&mut count, &query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count users")
            .map_err(AppError::database)?;

        let mut select = QueryBuilder::<Postgres>::new(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.is_active, u.last_login_at,
                   u.created_at,
                   COALESCE(
                       ARRAY_AGG(r.name ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
                       '{}'
                   ) AS roles
            FROM users u
            LEFT JOIN user_roles ur ON ur.user_id = u.id
            LEFT JOIN roles r ON r.id = ur.role_id
            WHERE 1=1
            "#,
        );
        push_user_filters(&mut select, &query);
        select
            .push(" GROUP BY u.id ORDER BY u.created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows: Vec<UserWithRolesRow> = select
            .build_query_as()
            .fetch_all(db)
            .await
            .context("Failed to fetch users")
            .map_err(AppError::database)?;

        Ok((
            rows.into_iter().map(UserResponse::from).collect(),
            pagination.meta(total),
        ))
    }

    /// Activates a pending user and grants `role` in one transaction.
    #[instrument(skip(db))]
    pub async fn approve_user(
        db: &PgPool,
        id: UserId,
        role: RoleName,
    ) -> Result<UserResponse, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock user")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        if user.is_active {
            return Err(AppError::bad_request(anyhow!("User is already active")));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to activate user")
        .map_err(AppError::database)?;

        RoleService::assign_role(&mut tx, id, role).await?;

        tx.commit()
            .await
            .context("Failed to commit approval")
            .map_err(AppError::database)?;

        info!(user_id = %id, role = %role, "User approved");
        Ok(UserResponse::from_user(user, vec![role.as_str().to_string()]))
    }

    /// Deletes a pending registration. The user must be inactive and hold no
    /// roles; the row stays locked until every dependent row is gone.
    #[instrument(skip(db))]
    pub async fn reject_user(db: &PgPool, id: UserId) -> Result<RejectedUser, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock user")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        if user.is_active {
            return Err(AppError::bad_request(anyhow!(
                "Cannot reject an active user"
            )));
        }

        let role_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE user_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to count user roles")
                .map_err(AppError::database)?;

        if role_count > 0 {
            return Err(AppError::bad_request(anyhow!(
                "Cannot reject a user who has assigned roles"
            )));
        }

        for statement in [
            "DELETE FROM accounts WHERE user_id = $1",
            "DELETE FROM user_roles WHERE user_id = $1",
            "DELETE FROM notification_preferences WHERE user_id = $1",
            "DELETE FROM permission_upgrade_requests WHERE user_id = $1",
            "DELETE FROM users WHERE id = $1",
        ] {
            sqlx::query(statement)
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to run `{statement}`"))
                .map_err(AppError::database)?;
        }

        tx.commit()
            .await
            .context("Failed to commit rejection")
            .map_err(AppError::database)?;

        info!(user_id = %id, "Pending user rejected");
        Ok(RejectedUser {
            id: user.id,
            name: user.full_name(),
            email: user.email,
        })
    }
}
