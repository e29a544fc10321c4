use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use schoolboard_core::permissions::{Permission, RoleName};

use crate::ids::RoleId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A role with the permissions its name grants.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl From<Role> for RoleWithPermissions {
    fn from(role: Role) -> Self {
        let permissions = role
            .name
            .parse::<RoleName>()
            .map(|r| r.permissions().to_vec())
            .unwrap_or_default();
        Self { role, permissions }
    }
}

/// The caller's own roles and what they allow.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyPermissions {
    pub roles: Vec<String>,
    pub effective_role: Option<RoleName>,
    pub permissions: Vec<Permission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> Role {
        Role {
            id: RoleId::new(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_known_role_permissions() {
        let with = RoleWithPermissions::from(role("office_member"));
        assert!(with.permissions.contains(&Permission::ManageCommunications));
    }

    #[test]
    fn test_unknown_role_grants_nothing() {
        let with = RoleWithPermissions::from(role("janitor"));
        assert!(with.permissions.is_empty());
    }
}
