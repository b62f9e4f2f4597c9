//! Password hashing via bcrypt.
//!
//! bcrypt is deliberately slow, so the async entry points run it on the
//! blocking pool instead of stalling a runtime worker.

use bcrypt::BcryptError;

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Cheapest cost bcrypt accepts. Tests only.
#[cfg(test)]
pub(crate) const TEST_BCRYPT_COST: u32 = 4;

/// Hash a password with bcrypt at the given cost.
///
/// Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected rather than
/// silently truncated.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::non_truncating_hash(password, cost).map_err(|e| match e {
        BcryptError::Truncation(_) => AuthError::ValidationError(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )),
        e => AuthError::Internal(format!("bcrypt hash: {e}")),
    })
}

/// Verify a password against a bcrypt hash (constant-time comparison).
///
/// An over-long password never matches.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    match bcrypt::non_truncating_verify(password, hash) {
        Ok(matched) => Ok(matched),
        Err(BcryptError::Truncation(_)) => Ok(false),
        Err(e) => Err(AuthError::Internal(format!("bcrypt verify: {e}"))),
    }
}

/// bcrypt hasher bound to a cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash on the blocking pool.
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
    }

    /// Verify on the blocking pool.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}
