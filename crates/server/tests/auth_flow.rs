use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use configs::AppConfig;
use server::routes::{self, auth::ServerState};

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

/// Router over a disconnected pool: enough for paths the middleware answers alone.
fn offline_app() -> Router {
    let state = ServerState::new(sea_orm::DatabaseConnection::Disconnected, "offline-secret", 900, "offline-card");
    routes::build_router(cors(), state)
}

async fn body_json(resp: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let resp = offline_app().oneshot(Request::builder().uri("/health").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_token() -> anyhow::Result<()> {
    let app = offline_app();
    let resp = app.clone().oneshot(Request::builder().uri("/api/v1/payers").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await?, json!({"code": 401, "message": "Unauthorized"}));

    let req = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

async fn online_app(email: &str, password: &str) -> anyhow::Result<Router> {
    let db = models::db::connect().await?;
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.auth.card_secret = "test-card-secret".into();
    cfg.auth.admin_email = email.into();
    cfg.auth.admin_password = password.into();
    server::startup::prepare_database(&db, &cfg).await?;
    Ok(server::startup::build_app(db, &cfg))
}

fn login_request(email: &str, password: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"email": email, "password": password}))?))?)
}

fn authed(method: &str, uri: &str, token: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?)
}

#[tokio::test]
async fn login_me_logout_flow() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let email = format!("admin_{}@example.com", Uuid::new_v4().simple());
    let app = online_app(&email, "S3curePass").await?;

    let resp = app.clone().oneshot(login_request(&email, "wrong-pass")?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.clone().oneshot(login_request(&email, "S3curePass")?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_some());
    let body = body_json(resp).await?;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["user"]["role"], "admin");
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    let resp = app.clone().oneshot(authed("GET", "/api/v1/auth/me", &token)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["data"]["email"], email.as_str());

    // the cookie alone is accepted too
    let req = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())?;
    assert_eq!(app.clone().oneshot(req).await?.status(), StatusCode::OK);

    let resp = app.clone().oneshot(authed("POST", "/api/v1/auth/logout", &token)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(authed("GET", "/api/v1/auth/me", &token)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn non_admin_cannot_add_accounts() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let admin = format!("admin_{}@example.com", Uuid::new_v4().simple());
    let app = online_app(&admin, "S3curePass").await?;
    let resp = app.clone().oneshot(login_request(&admin, "S3curePass")?).await?;
    let token = body_json(resp).await?["data"]["token"].as_str().unwrap_or_default().to_string();

    let viewer = format!("viewer_{}@example.com", Uuid::new_v4().simple());
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({
            "name": "Viewer", "email": viewer, "password": "viewer-pass",
            "role": "user", "status": "正常", "permissions": ["查看日志"]
        }))?))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["data"]["permissions"], json!(["LOG_VIEW"]));

    let resp = app.clone().oneshot(login_request(&viewer, "viewer-pass")?).await?;
    let viewer_token = body_json(resp).await?["data"]["token"].as_str().unwrap_or_default().to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/account/addAccount")
        .header(header::AUTHORIZATION, format!("Bearer {viewer_token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"uid": "123456789012", "account_name": "x"}))?))?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await?["code"], 1005);
    Ok(())
}
