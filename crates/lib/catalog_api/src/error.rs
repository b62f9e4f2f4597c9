//! Application error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog_core::auth::AuthError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Error: Username is already taken!")]
    UsernameTaken,

    #[error("Error: Email is already in use!")]
    EmailTaken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access token has expired")]
    TokenExpired,

    #[error("Refresh token was expired. Please make a new signin request")]
    RefreshTokenExpired,

    #[error("Refresh token is not in database!")]
    RefreshTokenNotRecognized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            AppError::UsernameTaken => (StatusCode::BAD_REQUEST, "username_taken", message),
            AppError::EmailTaken => (StatusCode::BAD_REQUEST, "email_taken", message),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.clone()),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired", message),
            AppError::RefreshTokenExpired => {
                (StatusCode::FORBIDDEN, "refresh_token_expired", message)
            }
            AppError::RefreshTokenNotRecognized => {
                (StatusCode::FORBIDDEN, "refresh_token_not_recognized", message)
            }
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.clone()),
            AppError::Internal(detail) => {
                error!(%detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::AuthenticationFailed => AppError::Unauthorized(e.to_string()),
            AuthError::Unauthenticated => AppError::Unauthorized(e.to_string()),
            AuthError::TokenInvalid => AppError::Unauthorized(e.to_string()),
            AuthError::TokenExpired => AppError::TokenExpired,
            AuthError::TokenNotRecognized => AppError::RefreshTokenNotRecognized,
            AuthError::UsernameTaken => AppError::UsernameTaken,
            AuthError::EmailTaken => AppError::EmailTaken,
            AuthError::Forbidden => AppError::Forbidden(e.to_string()),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::Configuration(msg) => AppError::Internal(format!("configuration: {msg}")),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_failures_are_unauthorized() {
        for e in [
            AuthError::Unauthenticated,
            AuthError::TokenInvalid,
            AuthError::AuthenticationFailed,
        ] {
            let resp = AppError::from(e).into_response();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
        let resp = AppError::from(AuthError::TokenExpired).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn configuration_errors_hide_detail() {
        let err = AppError::from(AuthError::Configuration("roles not seeded".into()));
        assert_eq!(err.to_string(), "Internal server error");
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn uniqueness_violations_are_bad_requests() {
        assert_eq!(
            AppError::from(AuthError::UsernameTaken).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AuthError::EmailTaken).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
