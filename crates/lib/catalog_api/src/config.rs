//! API server configuration.

use std::str::FromStr;

use catalog_core::config::{AuthConfig, resolve_jwt_secret};
use chrono::{Duration, Utc};
use tracing::warn;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Secret, token lifetimes and hashing cost handed to the auth core.
    pub auth: AuthConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                     | Default                                  |
    /// |------------------------------|------------------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:8080`                         |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/catalog`      |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file            |
    /// | `JWT_EXPIRATION_MS`          | `900000` (15 min)                        |
    /// | `JWT_REFRESH_EXPIRATION_MS`  | `604800000` (7 days)                     |
    /// | `BCRYPT_COST`                | `10`                                     |
    ///
    /// Unparsable, non-positive or unrepresentable lifetimes are ignored with
    /// a warning.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/catalog".into()),
            auth: auth_config_from_env(resolve_jwt_secret()),
        }
    }
}

fn auth_config_from_env(secret: String) -> AuthConfig {
    let mut auth = AuthConfig::new(secret);
    if let Some(ttl) = env_ttl_ms("JWT_EXPIRATION_MS") {
        auth = auth.with_access_token_ttl(ttl);
    }
    if let Some(ttl) = env_ttl_ms("JWT_REFRESH_EXPIRATION_MS") {
        auth = auth.with_refresh_token_ttl(ttl);
    }
    if let Some(cost) = std::env::var("BCRYPT_COST")
        .ok()
        .and_then(|raw| parse_value::<u32>("BCRYPT_COST", &raw))
    {
        auth = auth.with_bcrypt_cost(cost);
    }
    auth
}

fn env_ttl_ms(name: &str) -> Option<Duration> {
    parse_ttl_ms(name, &std::env::var(name).ok()?)
}

/// Parse a token lifetime in milliseconds. Must be positive and land on a
/// representable timestamp when added to now.
fn parse_ttl_ms(name: &str, raw: &str) -> Option<Duration> {
    let ms = parse_value::<i64>(name, raw)?;
    let ttl = Duration::try_milliseconds(ms).filter(|ttl| *ttl > Duration::zero());
    match ttl {
        Some(ttl) if Utc::now().checked_add_signed(ttl).is_some() => Some(ttl),
        _ => {
            warn!(var = name, value = ms, "ignoring out-of-range token lifetime");
            None
        }
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}
