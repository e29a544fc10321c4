use anyhow::{Context, anyhow};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use schoolboard_core::permissions::roles_grant;
use schoolboard_core::{AppError, Permission, RoleName};
use schoolboard_models::roles::{MyPermissions, Role};
use schoolboard_models::{RoleId, UserId};

pub struct RoleService;

/// Union of the permissions granted by the named roles, in declaration order.
pub fn permissions_for(role_names: &[String]) -> Vec<Permission> {
    Permission::ALL
        .into_iter()
        .filter(|p| roles_grant(role_names.iter().map(String::as_str), *p))
        .collect()
}

impl RoleService {
    /// Role names currently assigned to the user. Never cached.
    #[instrument(skip(db))]
    pub async fn role_names_for_user(db: &PgPool, user_id: UserId) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("Failed to load user roles")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn has_permission(
        db: &PgPool,
        user_id: UserId,
        permission: Permission,
    ) -> Result<bool, AppError> {
        let names = Self::role_names_for_user(db, user_id).await?;
        Ok(roles_grant(names.iter().map(String::as_str), permission))
    }

    #[instrument(skip(db))]
    pub async fn effective_role(db: &PgPool, user_id: UserId) -> Result<Option<RoleName>, AppError> {
        let names = Self::role_names_for_user(db, user_id).await?;
        Ok(RoleName::highest(names.iter().map(String::as_str)))
    }

    #[instrument(skip(db))]
    pub async fn list_roles(db: &PgPool) -> Result<Vec<Role>, AppError> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles ORDER BY name",
        )
        .fetch_all(db)
        .await
        .context("Failed to fetch roles")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn my_permissions(db: &PgPool, user_id: UserId) -> Result<MyPermissions, AppError> {
        let roles = Self::role_names_for_user(db, user_id).await?;
        let effective_role = RoleName::highest(roles.iter().map(String::as_str));
        let permissions = permissions_for(&roles);

        Ok(MyPermissions {
            roles,
            effective_role,
            permissions,
        })
    }

    /// Grants `role` to the user on an open connection or transaction.
    /// Granting a role the user already holds is a no-op.
    #[instrument(skip(conn))]
    pub async fn assign_role(
        conn: &mut PgConnection,
        user_id: UserId,
        role: RoleName,
    ) -> Result<(), AppError> {
        let role_id = sqlx::query_scalar::<_, RoleId>("SELECT id FROM roles WHERE name = $1")
            .bind(role.as_str())
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to look up role")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::internal(anyhow!("Role {} is not seeded", role)))?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *conn)
        .await
        .context("Failed to assign role")
        .map_err(AppError::database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_for_office_member() {
        let perms = permissions_for(&["office_member".to_string()]);
        assert!(perms.contains(&Permission::ManageCommunications));
        assert!(perms.contains(&Permission::ManageUploads));
        assert!(!perms.contains(&Permission::ManageUsers));
    }

    #[test]
    fn test_permissions_for_union_has_no_duplicates() {
        let perms = permissions_for(&["teacher".to_string(), "parent".to_string()]);
        assert_eq!(perms, vec![Permission::ViewCommunications]);
    }

    #[test]
    fn test_unknown_roles_grant_nothing() {
        assert!(permissions_for(&["janitor".to_string()]).is_empty());
        assert!(permissions_for(&[]).is_empty());
    }

    #[test]
    fn test_admin_gets_everything() {
        assert_eq!(
            permissions_for(&["admin".to_string()]),
            Permission::ALL.to_vec()
        );
    }
}
