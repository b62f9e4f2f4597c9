//! Authentication and authorization logic.
//!
//! Provides password hashing, credential verification, access-token minting,
//! refresh-token rotation and the role gate shared by `catalog_api`.

pub mod credentials;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod refresh;
pub mod roles;
pub mod service;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately indistinguishable.
    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Refresh token is not recognized")]
    TokenNotRecognized,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Email is already in use")]
    EmailTaken,

    #[error("Insufficient privileges")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Reference data missing (e.g. roles not seeded). Not recoverable per request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername => AuthError::UsernameTaken,
            StoreError::DuplicateEmail => AuthError::EmailTaken,
            StoreError::UnknownUser(id) => AuthError::Internal(format!("unknown user {id}")),
            StoreError::UnknownRole(id) => {
                AuthError::Configuration(format!("role id {id} is not seeded"))
            }
            StoreError::Db(e) => AuthError::DbError(e),
        }
    }
}
