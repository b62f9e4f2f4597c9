//! Role reference data for role-based access control.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// Every role, in seeding order.
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    /// Canonical stored name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Parse a canonical stored name (`ROLE_USER`, `ROLE_ADMIN`).
    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == name)
    }

    /// Map a role name requested at registration to a canonical role.
    ///
    /// Accepts `admin` / `user` and the canonical names, case-insensitively.
    /// Anything unrecognized falls back to [`Role::User`].
    pub fn from_requested(name: &str) -> Role {
        let name = name.trim();
        if name.eq_ignore_ascii_case("admin") || name.eq_ignore_ascii_case(Role::Admin.as_str()) {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
