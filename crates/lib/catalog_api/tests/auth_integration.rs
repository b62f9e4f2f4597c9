//! Integration tests: build the router over an in-memory store and drive it
//! with `oneshot` requests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use catalog_api::AppState;
use catalog_core::config::AuthConfig;
use catalog_core::store::memory::MemoryStore;
use chrono::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-0123456789abcdef";
const TEST_BCRYPT_COST: u32 = 4;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

fn app_with(auth: AuthConfig) -> (Router, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let config = auth.with_bcrypt_cost(TEST_BCRYPT_COST);
    let state = AppState::new(store.clone(), &config).expect("app state");
    (catalog_api::router(state), store)
}

fn app() -> (Router, Arc<MemoryStore>) {
    app_with(AuthConfig::new(SECRET))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request");
    dispatch(app, req).await
}

async fn dispatch(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let content_type = resp.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        assert_eq!(
            content_type.as_ref().map(|v| v.as_bytes()),
            Some(&b"application/json"[..]),
            "non-empty bodies are JSON"
        );
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

async fn register(
    app: &Router,
    username: &str,
    password: &str,
    roles: Option<&[&str]>,
) -> StatusCode {
    let mut body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": password,
    });
    if let Some(roles) = roles {
        body["roles"] = json!(roles);
    }
    send(app, Method::POST, "/api/v1/auth/register", None, Some(body))
        .await
        .0
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await
}

async fn refresh(app: &Router, token: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refreshToken": token})),
    )
    .await
}

#[tokio::test]
async fn register_login_refresh_scenario() {
    let (app, _) = app();

    assert_eq!(register(&app, "alice", "pw123", None).await, StatusCode::OK);

    let (status, body) = login(&app, "alice", "pw123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["roles"], json!(["ROLE_USER"]));
    assert!(body["accessToken"].is_string());
    assert!(body["userId"].is_string());
    let first = body["refreshToken"].as_str().expect("refresh token").to_string();

    let (status, body) = login(&app, "alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = refresh(&app, &first).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert!(body["accessToken"].is_string());
    let second = body["refreshToken"].as_str().expect("refresh token");
    assert_ne!(second, first);

    let (status, body) = refresh(&app, &first).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "refresh_token_not_recognized");
}

#[tokio::test]
async fn admin_only_mutation_checks_role() {
    let (app, store) = app();
    assert_eq!(register(&app, "bob", "pw", None).await, StatusCode::OK);
    assert_eq!(
        register(&app, "root", "pw", Some(&["admin"])).await,
        StatusCode::OK
    );

    let (_, bob) = login(&app, "bob", "pw").await;
    let (_, root) = login(&app, "root", "pw").await;
    let bob_id = bob["userId"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/admin/users/{bob_id}/refresh-token");

    let (status, body) = send(
        &app,
        Method::DELETE,
        &uri,
        bob["accessToken"].as_str(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(store.refresh_token_rows(), 2);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &uri,
        root["accessToken"].as_str(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    let (status, _) = refresh(&app, bob["refreshToken"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/v1/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6cHcxMjM=")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Admin routes reject anonymous callers before any role check.
    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/v1/admin/users/00000000-0000-0000-0000-000000000000/refresh-token",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_reports_resolved_identity() {
    let (app, _) = app();
    register(&app, "carol", "pw", Some(&["ROLE_ADMIN"])).await;
    let (_, session) = login(&app, "carol", "pw").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/auth/me",
        session["accessToken"].as_str(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "carol");
    assert_eq!(body["roles"], json!(["ROLE_ADMIN"]));
    assert_eq!(body["userId"], session["userId"]);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (app, store) = app();
    assert_eq!(register(&app, "alice", "pw123", None).await, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"username": "alice", "email": "other@example.com", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "username_taken");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"username": "alice2", "email": "alice@example.com", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email_taken");
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let (app, _) = app();
    register(&app, "dave", "pw", None).await;
    let (_, session) = login(&app, "dave", "pw").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/logout",
        session["accessToken"].as_str(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    let (status, _) = refresh(&app, session["refreshToken"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_refresh_token_is_forbidden_then_unknown() {
    let expired = AuthConfig::new(SECRET).with_refresh_token_ttl(Duration::seconds(-1));
    let (app, _) = app_with(expired);
    register(&app, "erin", "pw", None).await;
    let (_, session) = login(&app, "erin", "pw").await;
    let token = session["refreshToken"].as_str().unwrap();

    let (status, body) = refresh(&app, token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "refresh_token_expired");

    let (status, body) = refresh(&app, token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "refresh_token_not_recognized");
}

#[tokio::test]
async fn expired_access_token_is_unauthorized() {
    let expired = AuthConfig::new(SECRET).with_access_token_ttl(Duration::seconds(-30));
    let (app, _) = app_with(expired);
    register(&app, "frank", "pw", None).await;
    let (status, session) = login(&app, "frank", "pw").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/auth/me",
        session["accessToken"].as_str(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn malformed_bodies_are_json_validation_errors() {
    let (app, store) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, body) = dispatch(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/refresh")
        .body(Body::from(r#"{"refreshToken":"x"}"#))
        .expect("request");
    let (status, body) = dispatch(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(store.user_count().await, 0);
}

#[tokio::test]
async fn admin_path_rejects_non_uuid_user_id() {
    let (app, _) = app();
    register(&app, "root", "pw", Some(&["admin"])).await;
    let (_, root) = login(&app, "root", "pw").await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/api/v1/admin/users/not-a-uuid/refresh-token",
        root["accessToken"].as_str(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn over_long_registration_fields_are_bad_requests() {
    let (app, store) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "u".repeat(51),
            "email": "long@example.com",
            "password": "pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "long",
            "email": format!("{}@example.com", "e".repeat(100)),
            "password": "pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "long",
            "email": "long@example.com",
            "password": "p".repeat(73),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(store.user_count().await, 0);
}
