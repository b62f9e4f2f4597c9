//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    LoginRequest, LoginResponse, MeResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RevokeResponse,
};
use crate::services::auth;

/// `POST /api/v1/auth/login`: authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<LoginResponse>> {
    let resp = auth::login(&state.auth, body).await?;
    Ok(Json(resp))
}

/// `POST /api/v1/auth/register`: create a new user account. Empty 200 body.
pub async fn register_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<StatusCode> {
    auth::register(&state.auth, body).await?;
    Ok(StatusCode::OK)
}

/// `POST /api/v1/auth/refresh`: exchange a refresh token for a new token pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RefreshRequest>, AppError>,
) -> AppResult<Json<RefreshResponse>> {
    let resp = auth::refresh(&state.auth, &body.refresh_token).await?;
    Ok(Json(resp))
}

/// `POST /api/v1/auth/logout`: revoke the caller's refresh token.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> AppResult<Json<RevokeResponse>> {
    let resp = auth::revoke(&state.auth, user.id).await?;
    Ok(Json(resp))
}

/// `GET /api/v1/auth/me`
pub async fn me_handler(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<MeResponse> {
    Json(MeResponse::from(&user))
}
