//! Email engagement tracking: the open pixel and the provider event webhook.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES, PRAGMA};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sitesafe_core::error::CoreError;
use sitesafe_core::signing::{verify, SIGNATURE_HEADER};
use sitesafe_core::tracking::{pixel_gif, TrackingKind};
use sitesafe_core::types::Timestamp;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/track/open/{token}
///
/// Always answers with the 1x1 GIF. Unknown tokens and store errors are
/// logged and otherwise ignored.
pub async fn track_open(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    if let Ok(tracking_token) = Uuid::parse_str(token.trim_end_matches(".gif")) {
        let now = Utc::now();
        match state
            .store
            .record_engagement(tracking_token, TrackingKind::Open, now)
            .await
        {
            Ok(true) => {
                if let Err(e) = state
                    .store
                    .insert_tracking_event(tracking_token, TrackingKind::Open, None, now)
                    .await
                {
                    tracing::warn!(error = %e, "Failed to record open event");
                }
            }
            Ok(false) => tracing::debug!(%tracking_token, "Open pixel for unknown token"),
            Err(e) => tracing::warn!(error = %e, "Failed to record email open"),
        }
    }

    (
        [
            (CONTENT_TYPE, "image/gif"),
            (CACHE_CONTROL, "no-store, no-cache, must-revalidate, private"),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
        ],
        pixel_gif(),
    )
}

/// Engagement event posted by the email provider.
#[derive(Debug, Deserialize)]
pub struct TrackingEventInput {
    pub token: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub email: Option<String>,
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct TrackingEventAck {
    pub token: Uuid,
    #[serde(rename = "type")]
    pub kind: TrackingKind,
    pub recorded_at: Timestamp,
}

/// POST /api/v1/track/events
///
/// When a tracking secret is configured the raw body must carry a valid
/// `X-SiteSafe-Signature`.
pub async fn record_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<DataResponse<TrackingEventAck>>)> {
    if let Some(secret) = state.config.tracking_webhook_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| CoreError::Unauthorized("Missing webhook signature".into()))?;
        verify(secret, &body, signature)
            .map_err(|_| CoreError::Unauthorized("Invalid webhook signature".into()))?;
    }

    let input: TrackingEventInput = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid tracking event: {e}")))?;
    let token = Uuid::parse_str(input.token.trim())
        .map_err(|_| CoreError::Validation("token must be a UUID".into()))?;
    let kind: TrackingKind = input.kind.parse()?;
    let occurred_at = input.timestamp.unwrap_or_else(Utc::now);

    if !state.store.record_engagement(token, kind, occurred_at).await? {
        return Err(AppError::NotFound(format!("Unknown tracking token {token}")));
    }
    state
        .store
        .insert_tracking_event(token, kind, input.email.as_deref(), occurred_at)
        .await?;

    tracing::info!(%token, kind = %kind, "Tracking event recorded");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TrackingEventAck {
                token,
                kind,
                recorded_at: occurred_at,
            },
        }),
    ))
}
