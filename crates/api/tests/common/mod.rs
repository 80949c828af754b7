#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sitesafe_api::auth::{generate_access_token, JwtConfig, ROLE_ADMIN};
use sitesafe_api::config::ServerConfig;
use sitesafe_api::router::build_app_router;
use sitesafe_api::state::AppState;
use sitesafe_events::config::NotifyConfig;
use sitesafe_events::delivery::email::AutomationProvider;
use sitesafe_events::store::MemoryStore;
use sqlx::PgPool;
use tower::ServiceExt;

pub const CRON_SECRET: &str = "test-cron-secret";
pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

/// Build a test `ServerConfig` with safe defaults and no integrations wired.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig::new(JWT_SECRET),
        cron_secret: CRON_SECRET.to_string(),
        tracking_webhook_secret: None,
        notify: NotifyConfig {
            provider: AutomationProvider::Webhook,
            email_webhook_url: None,
            expiry_webhook_url: None,
            compliance_alert_webhook_url: None,
            webhook_signing_secret: None,
            public_base_url: "http://api.test".to_string(),
            portal_base_url: "http://portal.test/portal".to_string(),
            smtp: None,
        },
    }
}

/// Full router over an in-memory store. The pool is lazy and never
/// connects unless a handler queries it directly.
pub fn build_memory_app(store: Arc<MemoryStore>, config: ServerConfig) -> Router {
    let pool = sitesafe_db::create_lazy_pool("postgres://localhost/sitesafe_unused")
        .expect("lazy pool");
    let state = AppState::with_store(pool, config.clone(), store).expect("state");
    build_app_router(state, &config)
}

/// Full router over a real database, as production builds it.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone()).expect("state");
    build_app_router(state, &config)
}

pub fn admin_token() -> String {
    generate_access_token(1, ROLE_ADMIN, &JwtConfig::new(JWT_SECRET)).expect("token")
}

pub fn user_token() -> String {
    generate_access_token(2, "viewer", &JwtConfig::new(JWT_SECRET)).expect("token")
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str, bearer: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).expect("request")).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    bearer: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    send(
        app,
        builder
            .body(Body::from(serde_json::to_vec(&body).expect("json")))
            .expect("request"),
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON body")
}
