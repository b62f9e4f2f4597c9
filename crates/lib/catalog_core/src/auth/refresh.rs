//! Refresh token issuance, rotation and expiry.
//!
//! A user holds at most one refresh token. Issuing a token for a user who
//! already has one overwrites that row, so the previous token string stops
//! resolving the moment the new one is handed out. Tokens are random UUIDv4
//! strings; only their SHA-256 hash is stored.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::RefreshTokenRecord;
use crate::store::RefreshTokenRepository;

/// Default refresh token lifetime: 7 days (604,800,000 ms).
pub const DEFAULT_REFRESH_TOKEN_TTL_MS: i64 = 604_800_000;

/// A refresh token as handed to or presented by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: Uuid,
    /// Plaintext token string. Never persisted.
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    fn from_record(record: RefreshTokenRecord, token: String) -> Self {
        Self {
            id: record.id,
            token,
            user_id: record.user_id,
            expires_at: record.expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Generate an unguessable refresh token (UUIDv4, 122 random bits).
fn generate_refresh_token() -> String {
    Uuid::new_v4().to_string()
}

/// SHA-256 hash a refresh token for storage.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Single-active-refresh-token store.
#[derive(Clone)]
pub struct RefreshTokenService {
    repo: Arc<dyn RefreshTokenRepository>,
    ttl: Duration,
}

impl RefreshTokenService {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, ttl: Duration) -> Self {
        Self { repo, ttl }
    }

    /// Look up a presented token. No side effects.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        let record = self.repo.find_by_hash(&hash_refresh_token(token)).await?;
        Ok(record.map(|r| RefreshToken::from_record(r, token.to_string())))
    }

    /// Issue a fresh token for the user, replacing any existing one.
    ///
    /// The row is written before this returns, so the caller never hands out
    /// a token that is not yet durable.
    pub async fn issue_or_rotate(&self, user_id: Uuid) -> Result<RefreshToken, AuthError> {
        let token = generate_refresh_token();
        let expires_at = self.expiry_from_now()?;
        let record = self
            .repo
            .upsert_for_user(user_id, &hash_refresh_token(&token), expires_at)
            .await?;
        info!(%user_id, %expires_at, "refresh token issued");
        Ok(RefreshToken::from_record(record, token))
    }

    /// Replace `current` with a fresh token, but only if `current` is still
    /// the user's live token. Otherwise [`AuthError::TokenNotRecognized`].
    pub async fn rotate(&self, current: &RefreshToken) -> Result<RefreshToken, AuthError> {
        let token = generate_refresh_token();
        let expires_at = self.expiry_from_now()?;
        let record = self
            .repo
            .replace_if_current(
                current.user_id,
                &hash_refresh_token(&current.token),
                &hash_refresh_token(&token),
                expires_at,
            )
            .await?
            .ok_or(AuthError::TokenNotRecognized)?;
        info!(user_id = %current.user_id, %expires_at, "refresh token rotated in place");
        Ok(RefreshToken::from_record(record, token))
    }

    fn expiry_from_now(&self) -> Result<DateTime<Utc>, AuthError> {
        let ttl = self.ttl;
        Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            AuthError::Configuration(format!("refresh token lifetime {ttl} is out of range"))
        })
    }

    /// Pass a token through if still valid; otherwise delete its row and fail
    /// with [`AuthError::TokenExpired`]. An expired token can never be reused.
    pub async fn verify_not_expired(&self, token: RefreshToken) -> Result<RefreshToken, AuthError> {
        if !token.is_expired_at(Utc::now()) {
            return Ok(token);
        }
        // Conditional on the hash so a concurrent rotation's fresh row survives.
        self.repo
            .delete_if_current(token.user_id, &hash_refresh_token(&token.token))
            .await?;
        warn!(user_id = %token.user_id, "expired refresh token presented, row deleted");
        Err(AuthError::TokenExpired)
    }

    /// Delete the user's token if present. Idempotent; returns rows deleted.
    pub async fn revoke(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let deleted = self.repo.delete_for_user(user_id).await?;
        info!(%user_id, deleted, "refresh token revoked");
        Ok(deleted)
    }
}
