//! Persistence collaborators for the auth core.
//!
//! Two async traits describe what the auth components need from storage.
//! [`postgres::PgStore`] is the production backend; [`memory::MemoryStore`]
//! backs tests and single-process development runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::models::auth::{NewUser, RefreshTokenRecord, RoleRecord, User, UserWithPassword};

/// Storage errors. Uniqueness violations are classified so callers can map
/// them to domain failures instead of generic database errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("no user with id {0}")]
    UnknownUser(Uuid),

    #[error("no role with id {0}")]
    UnknownRole(i32),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// User lookup and registration.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user with password hash and resolved roles by username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<UserWithPassword>, StoreError>;

    /// Fetch a user with resolved roles by id.
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Look up the reference row for a role. `None` means roles were never seeded.
    async fn find_role(&self, role: Role) -> Result<Option<RoleRecord>, StoreError>;

    /// Insert the user and its role memberships atomically.
    ///
    /// Duplicate usernames/emails surface as [`StoreError::DuplicateUsername`] /
    /// [`StoreError::DuplicateEmail`] even when they lose a race with a
    /// concurrent insert.
    async fn create_user(&self, user: NewUser, roles: &[RoleRecord]) -> Result<User, StoreError>;

    /// Ensure every [`Role`] has a reference row. Idempotent.
    async fn seed_roles(&self) -> Result<(), StoreError>;
}

/// Refresh token rows, at most one per user.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn find_by_hash(&self, token_hash: &str)
    -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Insert the user's row, or overwrite hash and expiry of the existing one.
    async fn upsert_for_user(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError>;

    /// Swap the user's row to `new_hash` only if it still holds `current_hash`.
    /// `None` when the row is gone or already holds another token.
    async fn replace_if_current(
        &self,
        user_id: Uuid,
        current_hash: &str,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Delete the user's row only if it still holds `token_hash`. Returns rows deleted.
    async fn delete_if_current(&self, user_id: Uuid, token_hash: &str) -> Result<u64, StoreError>;

    /// Delete the user's row if any. Returns rows deleted.
    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
}
