//! Seeding configuration.

use schoolboard_core::permissions::RoleName;

/// Seed data for one user.
pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: RoleName,
}

/// How many accounts to create per role.
#[derive(Clone, Debug)]
pub struct UsersByRole {
    pub office_members: usize,
    pub teachers: usize,
    pub parents: usize,
}

impl Default for UsersByRole {
    fn default() -> Self {
        Self {
            office_members: 2,
            teachers: 10,
            parents: 40,
        }
    }
}

impl UsersByRole {
    pub fn total(&self) -> usize {
        self.office_members + self.teachers + self.parents
    }

    pub fn counts(&self) -> [(RoleName, usize); 3] {
        [
            (RoleName::OfficeMember, self.office_members),
            (RoleName::Teacher, self.teachers),
            (RoleName::Parent, self.parents),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub users: UsersByRole,
    pub communications: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            users: UsersByRole::default(),
            communications: 50,
        }
    }
}

impl SeedConfig {
    pub fn with_users(mut self, users: UsersByRole) -> Self {
        self.users = users;
        self
    }

    pub fn with_communications(mut self, count: usize) -> Self {
        self.communications = count;
        self
    }
}
