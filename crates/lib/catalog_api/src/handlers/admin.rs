//! ADMIN-only handlers. Routed behind `require_admin`.

use axum::Json;
use axum::extract::{Path, State};
use axum_extra::extract::WithRejection;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::RevokeResponse;
use crate::services::auth;

/// `DELETE /api/v1/admin/users/{userId}/refresh-token`: force a user to sign in again.
pub async fn revoke_user_refresh_token_handler(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<RevokeResponse>> {
    let resp = auth::revoke(&state.auth, user_id).await?;
    info!(%user_id, revoked = resp.revoked, "admin revoked refresh token");
    Ok(Json(resp))
}
