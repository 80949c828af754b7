//! Repository for the `notification_dedup` table.

use sitesafe_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::notification::CreateDedup;

pub struct NotificationDedupRepo;

impl NotificationDedupRepo {
    /// Whether a dedup row for `(key, type)` was written at or after `since`.
    pub async fn exists_since(
        pool: &PgPool,
        dedup_key: &str,
        notification_type: &str,
        since: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM notification_dedup \
                 WHERE dedup_key = $1 AND notification_type = $2 AND created_at >= $3 \
             )",
        )
        .bind(dedup_key)
        .bind(notification_type)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    pub async fn create(pool: &PgPool, input: &CreateDedup) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notification_dedup \
                 (dedup_key, notification_type, worker_id, contractor_id, campaign_id, expiry_date) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&input.dedup_key)
        .bind(&input.notification_type)
        .bind(input.worker_id)
        .bind(input.contractor_id)
        .bind(input.campaign_id)
        .bind(input.expiry_date)
        .execute(pool)
        .await?;
        Ok(())
    }
}
