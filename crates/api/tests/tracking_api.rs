//! HTTP-level tests for the open pixel and the provider event webhook.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use common::{body_bytes, body_json, build_memory_app, get, post_json, send, test_config};
use serde_json::json;
use sitesafe_core::campaign::CampaignType;
use sitesafe_core::signing::{signature_header_value, SIGNATURE_HEADER};
use sitesafe_core::tracking::pixel_gif;
use sitesafe_db::models::campaign::CreateCampaignEmail;
use sitesafe_events::store::{MemoryStore, NotificationStore};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Store holding one campaign email with a known tracking token.
async fn store_with_email() -> (Arc<MemoryStore>, Uuid) {
    let store = Arc::new(MemoryStore::new());
    let job = store.add_job(
        "Roof sheeting",
        chrono::Utc::now().date_naive(),
        "Depot 4",
        "22 Dock Rd",
    );
    let contractor = store.add_contractor("Top Roofing", "Ana Cruz", "ana@top.test");
    let campaign = store.add_campaign(job.id, CampaignType::Initial, "sent", None, None);
    let token = Uuid::new_v4();
    store
        .create_campaign_email(&CreateCampaignEmail {
            campaign_id: campaign.id,
            contractor_id: contractor.id,
            recipient_email: contractor.email.clone(),
            subject: "SWMS submission request".into(),
            tracking_token: token,
            portal_token_id: None,
        })
        .await
        .unwrap();
    (store, token)
}

fn signed_event(body: &serde_json::Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/track/events")
        .header(CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Open pixel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_pixel_counts_known_token() {
    let (store, token) = store_with_email().await;
    let app = build_memory_app(Arc::clone(&store), test_config());

    let response = get(app, &format!("/api/v1/track/open/{token}.gif"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "image/gif");
    assert!(response
        .headers()
        .get(CACHE_CONTROL)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("no-store"));
    assert_eq!(body_bytes(response).await, pixel_gif());

    let emails = store.emails();
    assert_eq!(emails[0].open_count, 1);
    assert!(emails[0].first_opened_at.is_some());
    assert_eq!(store.tracking_events().len(), 1);
}

#[tokio::test]
async fn open_pixel_served_for_unknown_or_garbage_token() {
    let (store, _) = store_with_email().await;
    let app = build_memory_app(Arc::clone(&store), test_config());

    for uri in [
        format!("/api/v1/track/open/{}", Uuid::new_v4()),
        "/api/v1/track/open/not-a-token".to_string(),
    ] {
        let response = get(app.clone(), &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, pixel_gif());
    }
    assert!(store.tracking_events().is_empty());
}

// ---------------------------------------------------------------------------
// Provider events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn click_event_is_recorded() {
    let (store, token) = store_with_email().await;
    let app = build_memory_app(Arc::clone(&store), test_config());

    let response = post_json(
        app,
        "/api/v1/track/events",
        json!({ "token": token, "type": "click", "email": "ana@top.test" }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["type"], "click");
    assert_eq!(store.emails()[0].click_count, 1);
    let events = store.tracking_events();
    assert_eq!(events[0].event_type, "click");
    assert_eq!(events[0].email.as_deref(), Some("ana@top.test"));
}

#[tokio::test]
async fn event_for_unknown_token_returns_404() {
    let (store, _) = store_with_email().await;
    let app = build_memory_app(store, test_config());

    let response = post_json(
        app,
        "/api/v1/track/events",
        json!({ "token": Uuid::new_v4(), "type": "open" }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_with_unknown_type_returns_400() {
    let (store, token) = store_with_email().await;
    let app = build_memory_app(store, test_config());

    let response = post_json(
        app,
        "/api/v1/track/events",
        json!({ "token": token, "type": "bounce" }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_events_require_valid_signature() {
    let (store, token) = store_with_email().await;
    let mut config = test_config();
    config.tracking_webhook_secret = Some("track-secret".into());
    let app = build_memory_app(Arc::clone(&store), config);
    let body = json!({ "token": token, "type": "open" });

    let missing = send(app.clone(), signed_event(&body, None)).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let forged = send(
        app.clone(),
        signed_event(&body, Some(signature_header_value("other", b"{}"))),
    )
    .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let bytes = serde_json::to_vec(&body).unwrap();
    let valid = send(
        app,
        signed_event(&body, Some(signature_header_value("track-secret", &bytes))),
    )
    .await;
    assert_eq!(valid.status(), StatusCode::CREATED);
    assert_eq!(store.emails()[0].open_count, 1);
}
