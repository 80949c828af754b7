//! Email engagement tracking events.

use serde::Serialize;
use sitesafe_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the append-only `tracking_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackingEvent {
    pub id: DbId,
    pub tracking_token: Uuid,
    pub event_type: String,
    pub email: Option<String>,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
}
