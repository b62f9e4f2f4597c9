//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types in `catalog_api::models` (which carry `#[serde(rename)]` for camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::roles::Role;

/// Domain user, as seen by everything downstream of credential checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl User {
    /// Whether the user holds `role`. Membership is exact; ADMIN does not imply USER.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Canonical role names (`ROLE_USER`, `ROLE_ADMIN`) for display.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }
}

/// User with password hash (for internal auth flows only).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

/// A user row about to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Row of the `roles` reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRecord {
    pub id: i32,
    pub role: Role,
}

/// Refresh token row stored in the database. Only the SHA-256 hash of the
/// token is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: username (standard JWT `sub` claim).
    pub sub: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}
