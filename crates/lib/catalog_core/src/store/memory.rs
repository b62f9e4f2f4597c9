//! In-memory store.
//!
//! Users live behind a single `RwLock` so registration checks both unique
//! keys and inserts under one write guard. Refresh tokens live in a `DashMap`
//! keyed by user id: the map key is the one-row-per-user constraint, and the
//! entry API makes each upsert atomic for its user.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RefreshTokenRepository, StoreError, UserStore};
use crate::auth::roles::Role;
use crate::models::auth::{NewUser, RefreshTokenRecord, RoleRecord, User, UserWithPassword};
use crate::uuid::uuidv7;

#[derive(Debug, Clone)]
struct StoredUser {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role_ids: Vec<i32>,
}

#[derive(Debug, Default)]
struct UserTables {
    users: HashMap<Uuid, StoredUser>,
    by_username: HashMap<String, Uuid>,
    by_email: HashMap<String, Uuid>,
    roles: HashMap<i32, Role>,
}

impl UserTables {
    fn to_user(&self, stored: &StoredUser) -> User {
        User {
            id: stored.id,
            username: stored.username.clone(),
            email: stored.email.clone(),
            roles: stored
                .role_ids
                .iter()
                .filter_map(|id| self.roles.get(id).copied())
                .collect(),
        }
    }

    fn seed_roles(&mut self) {
        for role in Role::ALL {
            if !self.roles.values().any(|r| *r == role) {
                let next_id = self.roles.keys().max().copied().unwrap_or(0) + 1;
                self.roles.insert(next_id, role);
            }
        }
    }
}

/// Process-local implementation of [`UserStore`] and [`RefreshTokenRepository`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<UserTables>,
    refresh_tokens: DashMap<Uuid, RefreshTokenRecord>,
}

impl MemoryStore {
    /// Create a store with role reference data already seeded.
    pub fn new() -> Self {
        let mut tables = UserTables::default();
        tables.seed_roles();
        Self {
            tables: RwLock::new(tables),
            refresh_tokens: DashMap::new(),
        }
    }

    /// Create a store without role reference data.
    pub fn unseeded() -> Self {
        Self::default()
    }

    /// Number of refresh token rows currently held for `user_id` (0 or 1).
    pub fn refresh_token_count(&self, user_id: Uuid) -> usize {
        usize::from(self.refresh_tokens.contains_key(&user_id))
    }

    /// Total number of refresh token rows.
    pub fn refresh_token_rows(&self) -> usize {
        self.refresh_tokens.len()
    }

    /// Total number of user rows.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_username
            .get(username)
            .and_then(|id| tables.users.get(id))
            .map(|stored| UserWithPassword {
                user: tables.to_user(stored),
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).map(|stored| tables.to_user(stored)))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.by_username.contains_key(username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.by_email.contains_key(email))
    }

    async fn find_role(&self, role: Role) -> Result<Option<RoleRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .iter()
            .find(|(_, r)| **r == role)
            .map(|(id, r)| RoleRecord { id: *id, role: *r }))
    }

    async fn create_user(&self, user: NewUser, roles: &[RoleRecord]) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.by_username.contains_key(&user.username) {
            return Err(StoreError::DuplicateUsername);
        }
        if tables.by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if let Some(missing) = roles.iter().find(|r| !tables.roles.contains_key(&r.id)) {
            return Err(StoreError::UnknownRole(missing.id));
        }

        let mut role_ids: Vec<i32> = roles.iter().map(|r| r.id).collect();
        role_ids.sort_unstable();
        role_ids.dedup();

        let stored = StoredUser {
            id: uuidv7(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role_ids,
        };
        tables.by_username.insert(stored.username.clone(), stored.id);
        tables.by_email.insert(stored.email.clone(), stored.id);
        let created = tables.to_user(&stored);
        tables.users.insert(stored.id, stored);
        Ok(created)
    }

    async fn seed_roles(&self) -> Result<(), StoreError> {
        self.tables.write().await.seed_roles();
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self
            .refresh_tokens
            .iter()
            .find(|entry| entry.token_hash == token_hash)
            .map(|entry| entry.value().clone()))
    }

    async fn upsert_for_user(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError> {
        if !self.tables.read().await.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser(user_id));
        }

        let record = self
            .refresh_tokens
            .entry(user_id)
            .and_modify(|row| {
                row.token_hash = token_hash.to_string();
                row.expires_at = expires_at;
            })
            .or_insert_with(|| RefreshTokenRecord {
                id: uuidv7(),
                user_id,
                token_hash: token_hash.to_string(),
                expires_at,
            })
            .value()
            .clone();
        Ok(record)
    }

    async fn replace_if_current(
        &self,
        user_id: Uuid,
        current_hash: &str,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        // The shard write guard makes check-and-swap atomic for this user.
        let Some(mut row) = self.refresh_tokens.get_mut(&user_id) else {
            return Ok(None);
        };
        if row.token_hash != current_hash {
            return Ok(None);
        }
        row.token_hash = new_hash.to_string();
        row.expires_at = expires_at;
        Ok(Some(row.value().clone()))
    }

    async fn delete_if_current(&self, user_id: Uuid, token_hash: &str) -> Result<u64, StoreError> {
        Ok(self
            .refresh_tokens
            .remove_if(&user_id, |_, row| row.token_hash == token_hash)
            .map_or(0, |_| 1))
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        Ok(self.refresh_tokens.remove(&user_id).map_or(0, |_| 1))
    }
}
