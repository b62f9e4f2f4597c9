//! Postgres-backed store.
//!
//! Uniqueness is enforced by the schema (see `migrations/`), not by
//! check-then-act in Rust: the pre-checks in the orchestrator are a fast path,
//! and a concurrent duplicate still lands here as a classified unique
//! violation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{RefreshTokenRepository, StoreError, UserStore};
use crate::auth::roles::Role;
use crate::models::auth::{NewUser, RefreshTokenRecord, RoleRecord, User, UserWithPassword};
use crate::uuid::uuidv7;

const USERS_USERNAME_KEY: &str = "users_username_key";
const USERS_EMAIL_KEY: &str = "users_email_key";

/// [`UserStore`] and [`RefreshTokenRepository`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch role names for a user.
    async fn user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT r.name FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 \
             ORDER BY r.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names
            .into_iter()
            .filter_map(|name| {
                let role = Role::from_name(&name);
                if role.is_none() {
                    warn!(%user_id, role = %name, "ignoring unknown role name");
                }
                role
            })
            .collect())
    }
}

/// Map unique violations on the users table to their domain meaning.
fn classify_user_insert(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(USERS_USERNAME_KEY) => return StoreError::DuplicateUsername,
                Some(USERS_EMAIL_KEY) => return StoreError::DuplicateEmail,
                _ => {}
            }
        }
    }
    StoreError::Db(e)
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String)>(
            "SELECT id, username, email, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, username, email, password_hash)) = row else {
            return Ok(None);
        };
        let roles = self.user_roles(id).await?;
        Ok(Some(UserWithPassword {
            user: User {
                id,
                username,
                email,
                roles,
            },
            password_hash,
        }))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT username, email FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((username, email)) = row else {
            return Ok(None);
        };
        let roles = self.user_roles(user_id).await?;
        Ok(Some(User {
            id: user_id,
            username,
            email,
            roles,
        }))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_role(&self, role: Role) -> Result<Option<RoleRecord>, StoreError> {
        let id = sqlx::query_scalar::<_, i32>("SELECT id FROM roles WHERE name = $1")
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(|id| RoleRecord { id, role }))
    }

    async fn create_user(&self, user: NewUser, roles: &[RoleRecord]) -> Result<User, StoreError> {
        let user_id = uuidv7();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(classify_user_insert)?;

        for role in roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(role.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::UnknownRole(role.id)
                } else {
                    StoreError::Db(e)
                }
            })?;
        }

        tx.commit().await?;

        let mut resolved: Vec<Role> = roles.iter().map(|r| r.role).collect();
        resolved.sort_unstable();
        resolved.dedup();
        Ok(User {
            id: user_id,
            username: user.username,
            email: user.email,
            roles: resolved,
        })
    }

    async fn seed_roles(&self) -> Result<(), StoreError> {
        for role in Role::ALL {
            sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
                .bind(role.as_str())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for PgStore {
    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            "SELECT id, user_id, token_hash, expires_at \
             FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, user_id, token_hash, expires_at)| RefreshTokenRecord {
            id,
            user_id,
            token_hash,
            expires_at,
        }))
    }

    async fn upsert_for_user(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError> {
        let (id, token_hash, expires_at) = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE \
             SET token_hash = EXCLUDED.token_hash, expires_at = EXCLUDED.expires_at \
             RETURNING id, token_hash, expires_at",
        )
        .bind(uuidv7())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::UnknownUser(user_id)
            } else {
                StoreError::Db(e)
            }
        })?;

        Ok(RefreshTokenRecord {
            id,
            user_id,
            token_hash,
            expires_at,
        })
    }

    async fn replace_if_current(
        &self,
        user_id: Uuid,
        current_hash: &str,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "UPDATE refresh_tokens SET token_hash = $3, expires_at = $4 \
             WHERE user_id = $1 AND token_hash = $2 \
             RETURNING id, token_hash, expires_at",
        )
        .bind(user_id)
        .bind(current_hash)
        .bind(new_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, token_hash, expires_at)| RefreshTokenRecord {
            id,
            user_id,
            token_hash,
            expires_at,
        }))
    }

    async fn delete_if_current(&self, user_id: Uuid, token_hash: &str) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2")
                .bind(user_id)
                .bind(token_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
