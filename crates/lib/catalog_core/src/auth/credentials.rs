//! Username/password verification against stored bcrypt hashes.

use std::sync::Arc;

use tracing::debug;

use super::AuthError;
use super::password::{PasswordHasher, hash_password};
use crate::models::auth::User;
use crate::store::UserStore;

/// Verifies credentials. Unknown usernames still pay for one bcrypt check
/// against a throwaway hash, so response time does not reveal which
/// usernames exist.
#[derive(Clone)]
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    dummy_hash: String,
}

impl CredentialVerifier {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher) -> Result<Self, AuthError> {
        let dummy_hash = hash_password("catalog-unknown-user", hasher.cost())?;
        Ok(Self {
            users,
            hasher,
            dummy_hash,
        })
    }

    /// Return the user on a username/password match, else
    /// [`AuthError::AuthenticationFailed`].
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some(found) = self.users.find_by_username(username).await? else {
            let _ = self.hasher.verify(password, &self.dummy_hash).await;
            debug!("login rejected: unknown username");
            return Err(AuthError::AuthenticationFailed);
        };

        if self.hasher.verify(password, &found.password_hash).await? {
            Ok(found.user)
        } else {
            debug!(user_id = %found.user.id, "login rejected: password mismatch");
            Err(AuthError::AuthenticationFailed)
        }
    }
}
