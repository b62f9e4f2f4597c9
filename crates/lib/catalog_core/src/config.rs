//! Auth core configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Duration;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::auth::refresh::DEFAULT_REFRESH_TOKEN_TTL_MS;

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_MS: i64 = 15 * 60 * 1000;

/// Immutable settings injected into the auth components at startup.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC signing secret. Opaque; never logged.
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Config with the given secret and default lifetimes.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::milliseconds(DEFAULT_ACCESS_TOKEN_TTL_MS),
            refresh_token_ttl: Duration::milliseconds(DEFAULT_REFRESH_TOKEN_TTL_MS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    for var in ["JWT_SECRET", "AUTH_SECRET"] {
        match std::env::var(var) {
            Ok(secret) if !secret.is_empty() => return secret,
            _ => {}
        }
    }
    resolve_jwt_secret_at(&jwt_secret_path())
}

/// Read the secret persisted at `path`, generating and persisting one if absent.
pub fn resolve_jwt_secret_at(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::write(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(path = %path.display(), "could not persist JWT secret: {e}"),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("catalog")
        .join("jwt-secret")
}
