//! Request authentication and role checks for protected operations.

use std::sync::Arc;

use tracing::debug;

use super::AuthError;
use super::jwt::TokenCodec;
use super::roles::Role;
use crate::models::auth::User;
use crate::store::UserStore;

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// Any other scheme, or an empty token, yields `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves a caller identity from an access token and enforces required roles.
#[derive(Clone)]
pub struct AuthorizationGate {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserStore>,
}

impl AuthorizationGate {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserStore>) -> Self {
        Self { codec, users }
    }

    /// Authenticate the raw `Authorization` header value.
    ///
    /// Roles come from the user's current stored memberships, not from the
    /// token.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<User, AuthError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::Unauthenticated)?;
        let username = self.codec.validate(token)?;

        match self.users.find_by_username(&username).await? {
            Some(found) => Ok(found.user),
            None => {
                debug!(%username, "token subject no longer exists");
                Err(AuthError::TokenInvalid)
            }
        }
    }

    /// Require `role` on an authenticated user.
    pub fn authorize(&self, user: &User, role: Role) -> Result<(), AuthError> {
        if user.has_role(role) {
            Ok(())
        } else {
            debug!(user_id = %user.id, required = %role, "role check failed");
            Err(AuthError::Forbidden)
        }
    }
}
