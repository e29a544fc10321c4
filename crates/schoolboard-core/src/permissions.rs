//! Roles and the permissions they grant.
//!
//! Both sets are closed. Role rows in the database whose name does not
//! parse into a [`RoleName`] grant nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewCommunications,
    ManageCommunications,
    AccessAdminPanel,
    ManageUsers,
    ReviewUpgradeRequests,
    ManageSettings,
    ManageUploads,
}

impl Permission {
    pub const ALL: [Permission; 7] = [
        Permission::ViewCommunications,
        Permission::ManageCommunications,
        Permission::AccessAdminPanel,
        Permission::ManageUsers,
        Permission::ReviewUpgradeRequests,
        Permission::ManageSettings,
        Permission::ManageUploads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewCommunications => "communications:view",
            Permission::ManageCommunications => "communications:manage",
            Permission::AccessAdminPanel => "admin:access",
            Permission::ManageUsers => "users:manage",
            Permission::ReviewUpgradeRequests => "upgrade_requests:review",
            Permission::ManageSettings => "settings:manage",
            Permission::ManageUploads => "uploads:manage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    Admin,
    OfficeMember,
    Teacher,
    Parent,
}

const ADMIN_PERMISSIONS: &[Permission] = &Permission::ALL;

const OFFICE_MEMBER_PERMISSIONS: &[Permission] = &[
    Permission::ViewCommunications,
    Permission::ManageCommunications,
    Permission::AccessAdminPanel,
    Permission::ManageUploads,
];

const READER_PERMISSIONS: &[Permission] = &[Permission::ViewCommunications];

impl RoleName {
    pub const ALL: [RoleName; 4] = [
        RoleName::Admin,
        RoleName::OfficeMember,
        RoleName::Teacher,
        RoleName::Parent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::OfficeMember => "office_member",
            RoleName::Teacher => "teacher",
            RoleName::Parent => "parent",
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            RoleName::Admin => ADMIN_PERMISSIONS,
            RoleName::OfficeMember => OFFICE_MEMBER_PERMISSIONS,
            RoleName::Teacher | RoleName::Parent => READER_PERMISSIONS,
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Higher ranks win when a user holds several roles.
    pub fn rank(&self) -> u8 {
        match self {
            RoleName::Admin => 4,
            RoleName::OfficeMember => 3,
            RoleName::Teacher => 2,
            RoleName::Parent => 1,
        }
    }

    /// Admins and office members see every communication regardless of
    /// status, audience or expiry.
    pub fn is_privileged_viewer(&self) -> bool {
        matches!(self, RoleName::Admin | RoleName::OfficeMember)
    }

    /// Picks the highest-ranked role, ignoring names that are not roles.
    pub fn highest<'a, I>(names: I) -> Option<RoleName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|n| n.parse::<RoleName>().ok())
            .max_by_key(RoleName::rank)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(RoleName::Admin),
            "office_member" => Ok(RoleName::OfficeMember),
            "teacher" => Ok(RoleName::Teacher),
            "parent" => Ok(RoleName::Parent),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// True when any of the named roles grants `permission`.
pub fn roles_grant<'a, I>(role_names: I, permission: Permission) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    role_names
        .into_iter()
        .filter_map(|n| n.parse::<RoleName>().ok())
        .any(|role| role.grants(permission))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        for permission in Permission::ALL {
            assert!(RoleName::Admin.grants(permission), "{permission}");
        }
    }

    #[test]
    fn test_office_member_permissions() {
        let role = RoleName::OfficeMember;
        assert!(role.grants(Permission::ManageCommunications));
        assert!(role.grants(Permission::ManageUploads));
        assert!(!role.grants(Permission::ManageUsers));
        assert!(!role.grants(Permission::ManageSettings));
    }

    #[test]
    fn test_readers_only_view() {
        for role in [RoleName::Teacher, RoleName::Parent] {
            assert_eq!(role.permissions(), &[Permission::ViewCommunications]);
        }
    }

    #[test]
    fn test_parse_round_trips_as_str() {
        for role in RoleName::ALL {
            assert_eq!(role.as_str().parse::<RoleName>().unwrap(), role);
        }
        assert!("janitor".parse::<RoleName>().is_err());
    }

    #[test]
    fn test_highest_role() {
        assert_eq!(
            RoleName::highest(["parent", "office_member", "teacher"]),
            Some(RoleName::OfficeMember)
        );
        assert_eq!(RoleName::highest(["unknown"]), None);
        assert_eq!(RoleName::highest(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_unknown_roles_grant_nothing() {
        assert!(!roles_grant(["superuser"], Permission::ViewCommunications));
        assert!(roles_grant(
            ["superuser", "admin"],
            Permission::ManageSettings
        ));
    }

    #[test]
    fn test_privileged_viewers() {
        assert!(RoleName::Admin.is_privileged_viewer());
        assert!(RoleName::OfficeMember.is_privileged_viewer());
        assert!(!RoleName::Teacher.is_privileged_viewer());
        assert!(!RoleName::Parent.is_privileged_viewer());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&RoleName::OfficeMember).unwrap();
        assert_eq!(json, r#""office_member""#);
    }
}
