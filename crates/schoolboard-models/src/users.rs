//! Users and admin user management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use schoolboard_core::PaginationParams;
use schoolboard_core::permissions::RoleName;
use schoolboard_core::query::{lenient_option, trimmed_string};

use crate::ids::UserId;

/// A user row.
///
/// `password_hash` is `None` for accounts that only sign in through OAuth.
/// New registrations start inactive with no roles until an admin approves
/// them.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: User, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            roles,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Row shape for the admin listing, roles aggregated in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithRolesRow {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<String>,
}

impl From<UserWithRolesRow> for UserResponse {
    fn from(row: UserWithRolesRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            roles: row.roles,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatusFilter {
    Pending,
    Active,
}

impl std::str::FromStr for UserStatusFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "inactive" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// `pending` or `active`; anything else is ignored
    #[serde(default, deserialize_with = "lenient_option")]
    #[param(value_type = Option<String>)]
    pub status: Option<UserStatusFilter>,
    /// Matches email, first or last name
    #[serde(default, deserialize_with = "trimmed_string")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub limit: Option<i64>,
}

impl UserListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApproveUserDto {
    #[schema(value_type = String, example = "parent")]
    pub role: RoleName,
}

/// Returned after a pending registration is rejected and deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectedUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(),
            email: "parent@school.test".to_string(),
            password_hash: Some("$2b$12$hash".to_string()),
            first_name: "Mary".to_string(),
            last_name: "Jackson".to_string(),
            is_active: false,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_never_carries_password_hash() {
        let response = UserResponse::from_user(user(), vec![]);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("hash"));
        assert!(json.contains(r#""firstName":"Mary""#));
        assert!(json.contains(r#""isActive":false"#));
    }

    #[test]
    fn test_full_name() {
        assert_eq!(user().full_name(), "Mary Jackson");
    }

    #[test]
    fn test_status_filter_lenient() {
        let q: UserListQuery = serde_json::from_str(r#"{"status":"ACTIVE"}"#).unwrap();
        assert_eq!(q.status, Some(UserStatusFilter::Active));

        let q: UserListQuery = serde_json::from_str(r#"{"status":"banned"}"#).unwrap();
        assert_eq!(q.status, None);
    }

    #[test]
    fn test_approve_dto_requires_known_role() {
        assert!(serde_json::from_str::<ApproveUserDto>(r#"{"role":"office_member"}"#).is_ok());
        assert!(serde_json::from_str::<ApproveUserDto>(r#"{"role":"wizard"}"#).is_err());
    }
}
