//! Authentication orchestration: login, registration and refresh rotation.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use super::AuthError;
use super::credentials::CredentialVerifier;
use super::jwt::TokenCodec;
use super::password::PasswordHasher;
use super::refresh::{RefreshToken, RefreshTokenService};
use super::roles::Role;
use crate::config::AuthConfig;
use crate::models::auth::{NewUser, User};
use crate::store::{RefreshTokenRepository, UserStore};

/// Registration input. `roles` holds the raw requested role names, if any.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Option<Vec<String>>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: RefreshToken,
    pub user: User,
}

/// Result of a successful refresh rotation.
#[derive(Debug, Clone)]
pub struct RotatedTokens {
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

/// Longest accepted username, in characters. Matches `users.username`.
pub const MAX_USERNAME_CHARS: usize = 50;

/// Longest accepted email, in characters. Matches `users.email`.
pub const MAX_EMAIL_CHARS: usize = 100;

/// Map requested role names to canonical roles.
///
/// No request (or an empty one) yields `{USER}`. Unrecognized names fall back
/// to USER rather than being rejected.
pub fn resolve_requested_roles(requested: Option<&[String]>) -> BTreeSet<Role> {
    match requested {
        Some(names) if !names.is_empty() => names.iter().map(|n| Role::from_requested(n)).collect(),
        _ => BTreeSet::from([Role::User]),
    }
}

/// Composes credential checks, token minting and refresh rotation.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    credentials: CredentialVerifier,
    codec: Arc<TokenCodec>,
    refresh_tokens: RefreshTokenService,
    hasher: PasswordHasher,
    access_token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_repo: Arc<dyn RefreshTokenRepository>,
        config: &AuthConfig,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        Ok(Self {
            credentials: CredentialVerifier::new(users.clone(), hasher)?,
            users,
            codec: Arc::new(TokenCodec::new(config.jwt_secret.as_bytes())),
            refresh_tokens: RefreshTokenService::new(refresh_repo, config.refresh_token_ttl),
            hasher,
            access_token_ttl: config.access_token_ttl,
        })
    }

    pub fn codec(&self) -> Arc<TokenCodec> {
        self.codec.clone()
    }

    pub fn users(&self) -> Arc<dyn UserStore> {
        self.users.clone()
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenService {
        &self.refresh_tokens
    }

    /// Authenticate with username + password and issue a token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self.credentials.verify(username, password).await?;
        let access_token = self.codec.mint(&user.username, self.access_token_ttl)?;
        let refresh_token = self.refresh_tokens.issue_or_rotate(user.id).await?;

        info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok(LoginOutcome {
            access_token,
            refresh_token,
            user,
        })
    }

    /// Register a new user account.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let Registration {
            username,
            email,
            password,
            roles,
        } = registration;

        if username.trim().is_empty() {
            return Err(AuthError::ValidationError("Username must not be blank".into()));
        }
        if email.trim().is_empty() {
            return Err(AuthError::ValidationError("Email must not be blank".into()));
        }
        if password.is_empty() {
            return Err(AuthError::ValidationError("Password must not be blank".into()));
        }
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(AuthError::ValidationError(format!(
                "Username must be at most {MAX_USERNAME_CHARS} characters"
            )));
        }
        if email.chars().count() > MAX_EMAIL_CHARS {
            return Err(AuthError::ValidationError(format!(
                "Email must be at most {MAX_EMAIL_CHARS} characters"
            )));
        }

        if self.users.username_exists(&username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let mut role_records = Vec::new();
        for role in resolve_requested_roles(roles.as_deref()) {
            let record = self
                .users
                .find_role(role)
                .await?
                .ok_or_else(|| AuthError::Configuration(format!("role {role} is not seeded")))?;
            role_records.push(record);
        }

        let password_hash = self.hasher.hash(&password).await?;
        let user = self
            .users
            .create_user(
                NewUser {
                    username,
                    email,
                    password_hash,
                },
                &role_records,
            )
            .await?;

        info!(
            user_id = %user.id,
            username = %user.username,
            roles = ?user.role_names(),
            "user registered"
        );
        Ok(user)
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token is consumed even when still valid. The swap only
    /// lands if the user's row still holds the presented token, so of two
    /// concurrent refreshes with the same token exactly one succeeds.
    pub async fn refresh(&self, presented: &str) -> Result<RotatedTokens, AuthError> {
        let token = self
            .refresh_tokens
            .find_by_token(presented)
            .await?
            .ok_or(AuthError::TokenNotRecognized)?;
        let token = self.refresh_tokens.verify_not_expired(token).await?;

        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(AuthError::TokenNotRecognized)?;

        let access_token = self.codec.mint(&user.username, self.access_token_ttl)?;
        let refresh_token = self.refresh_tokens.rotate(&token).await?;

        info!(user_id = %user.id, "refresh token rotated");
        Ok(RotatedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Drop the user's refresh token. Returns rows deleted (0 or 1).
    pub async fn logout(&self, user_id: Uuid) -> Result<u64, AuthError> {
        self.refresh_tokens.revoke(user_id).await
    }
}
