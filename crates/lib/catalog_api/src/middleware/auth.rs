//! Authentication middleware: bearer token resolution and role checks.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use catalog_core::auth::roles::Role;
use catalog_core::models::auth::User;

use crate::AppState;
use crate::error::AppError;

/// Identity resolved by [`require_auth`], stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Axum middleware: resolves `Authorization: Bearer <token>` through the gate
/// and injects [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user = state.gate.authenticate(header).await?;
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

/// Axum middleware: requires ADMIN on the identity set by [`require_auth`].
/// Must be layered inside `require_auth`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(AuthenticatedUser(user)) = request.extensions().get::<AuthenticatedUser>() else {
        return Err(AppError::Unauthorized("Authentication required".into()));
    };
    state.gate.authorize(user, Role::Admin)?;

    Ok(next.run(request).await)
}
