//! Repository for the append-only `tracking_events` table.

use sitesafe_core::tracking::TrackingKind;
use sitesafe_core::types::{DbId, Timestamp};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::tracking::TrackingEvent;

/// Column list for `tracking_events` queries.
const COLUMNS: &str = "id, tracking_token, event_type, email, occurred_at, created_at";

pub struct TrackingEventRepo;

impl TrackingEventRepo {
    pub async fn create(
        pool: &PgPool,
        tracking_token: Uuid,
        kind: TrackingKind,
        email: Option<&str>,
        occurred_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO tracking_events (tracking_token, event_type, email, occurred_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(tracking_token)
        .bind(kind.as_str())
        .bind(email)
        .bind(occurred_at)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_token(
        pool: &PgPool,
        tracking_token: Uuid,
    ) -> Result<Vec<TrackingEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tracking_events \
             WHERE tracking_token = $1 \
             ORDER BY occurred_at, id"
        );
        sqlx::query_as::<_, TrackingEvent>(&query)
            .bind(tracking_token)
            .fetch_all(pool)
            .await
    }
}
