//! # catalog_api
//!
//! HTTP API for the catalog auth service.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use catalog_core::auth::AuthError;
use catalog_core::auth::gate::AuthorizationGate;
use catalog_core::auth::service::AuthService;
use catalog_core::config::AuthConfig;
use catalog_core::store::{RefreshTokenRepository, UserStore};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, auth};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub gate: Arc<AuthorizationGate>,
}

impl AppState {
    /// Wire the auth components over a store that backs both users and
    /// refresh tokens.
    pub fn new<S>(store: Arc<S>, config: &AuthConfig) -> Result<Self, AuthError>
    where
        S: UserStore + RefreshTokenRepository + 'static,
    {
        let auth = AuthService::new(store.clone(), store, config)?;
        let gate = AuthorizationGate::new(auth.codec(), auth.users());
        Ok(Self {
            auth: Arc::new(auth),
            gate: Arc::new(gate),
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `catalog_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    catalog_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler));

    // ADMIN-only mutations
    let admin = Router::new()
        .route(
            routes::DELETE_ADMIN_USER_REFRESH_TOKEN,
            delete(admin::revoke_user_refresh_token_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    // Protected routes (require auth); runs before the admin role check
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .merge(admin)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
