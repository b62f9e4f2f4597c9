//! Authentication service: HTTP-facing flows delegating to `catalog_core::auth`.

use catalog_core::auth::AuthError;
use catalog_core::auth::service::{AuthService, Registration};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    LoginRequest, LoginResponse, RefreshResponse, RegisterRequest, RevokeResponse,
    TOKEN_TYPE_BEARER,
};

/// Authenticate with username + password.
pub async fn login(auth: &AuthService, body: LoginRequest) -> AppResult<LoginResponse> {
    let outcome = auth.login(&body.username, &body.password).await?;
    Ok(LoginResponse {
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token.token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        user_id: outcome.user.id,
        username: outcome.user.username.clone(),
        email: outcome.user.email.clone(),
        roles: outcome.user.role_names(),
    })
}

/// Register a new user account.
pub async fn register(auth: &AuthService, body: RegisterRequest) -> AppResult<()> {
    auth.register(Registration {
        username: body.username,
        email: body.email,
        password: body.password,
        roles: body.roles,
    })
    .await?;
    Ok(())
}

/// Exchange a refresh token for a new token pair.
///
/// Expired and unknown refresh tokens are 403s here, unlike expired access
/// tokens at the gate.
pub async fn refresh(auth: &AuthService, refresh_token: &str) -> AppResult<RefreshResponse> {
    let rotated = auth.refresh(refresh_token).await.map_err(|e| match e {
        AuthError::TokenExpired => AppError::RefreshTokenExpired,
        AuthError::TokenNotRecognized => AppError::RefreshTokenNotRecognized,
        other => AppError::from(other),
    })?;
    Ok(RefreshResponse {
        access_token: rotated.access_token,
        refresh_token: rotated.refresh_token.token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
    })
}

/// Revoke a user's refresh token.
pub async fn revoke(auth: &AuthService, user_id: Uuid) -> AppResult<RevokeResponse> {
    let revoked = auth.logout(user_id).await?;
    Ok(RevokeResponse { revoked })
}
