//! Repository for the append-only `notification_audit` table.

use sitesafe_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{AuditQuery, CreateAudit, NotificationAudit};

/// Column list for `notification_audit` queries.
const COLUMNS: &str = "id, notification_type, result, recipient, worker_id, contractor_id, \
    swms_job_id, campaign_id, error_message, details, created_at";

/// Default page size for audit listings.
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;

/// Largest page size accepted for audit listings.
pub const MAX_AUDIT_LIMIT: i64 = 200;

pub struct NotificationAuditRepo;

impl NotificationAuditRepo {
    pub async fn create(pool: &PgPool, input: &CreateAudit) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_audit \
                 (notification_type, result, recipient, worker_id, contractor_id, \
                  swms_job_id, campaign_id, error_message, details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(&input.notification_type)
        .bind(input.result.as_str())
        .bind(&input.recipient)
        .bind(input.worker_id)
        .bind(input.contractor_id)
        .bind(input.swms_job_id)
        .bind(input.campaign_id)
        .bind(&input.error_message)
        .bind(&input.details)
        .fetch_one(pool)
        .await
    }

    /// Newest-first listing with optional type/result filters.
    pub async fn list(
        pool: &PgPool,
        params: &AuditQuery,
    ) -> Result<Vec<NotificationAudit>, sqlx::Error> {
        let limit = params
            .limit
            .unwrap_or(DEFAULT_AUDIT_LIMIT)
            .clamp(1, MAX_AUDIT_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM notification_audit \
             WHERE ($1::TEXT IS NULL OR notification_type = $1) \
               AND ($2::TEXT IS NULL OR result = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, NotificationAudit>(&query)
            .bind(&params.notification_type)
            .bind(&params.result)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
