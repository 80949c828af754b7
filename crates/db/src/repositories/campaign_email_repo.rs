//! Repository for the `swms_campaign_emails` table.

use sitesafe_core::notification::DeliveryStatus;
use sitesafe_core::tracking::TrackingKind;
use sitesafe_core::types::{DbId, Timestamp};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::campaign::{CampaignEmail, CreateCampaignEmail};

/// Column list for `swms_campaign_emails` queries.
const COLUMNS: &str = "id, campaign_id, contractor_id, recipient_email, subject, status, \
    error_message, tracking_token, portal_token_id, sent_at, open_count, click_count, \
    first_opened_at, first_clicked_at, created_at, updated_at";

pub struct CampaignEmailRepo;

impl CampaignEmailRepo {
    /// Record a `pending` email, returning its ID.
    pub async fn create(pool: &PgPool, input: &CreateCampaignEmail) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO swms_campaign_emails \
                 (campaign_id, contractor_id, recipient_email, subject, status, \
                  tracking_token, portal_token_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(input.campaign_id)
        .bind(input.contractor_id)
        .bind(&input.recipient_email)
        .bind(&input.subject)
        .bind(DeliveryStatus::Pending.as_str())
        .bind(input.tracking_token)
        .bind(input.portal_token_id)
        .fetch_one(pool)
        .await
    }

    pub async fn mark_sent(pool: &PgPool, id: DbId, sent_at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE swms_campaign_emails \
             SET status = $2, sent_at = $3, error_message = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(DeliveryStatus::Sent.as_str())
        .bind(sent_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE swms_campaign_emails \
             SET status = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(DeliveryStatus::Failed.as_str())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_tracking_token(
        pool: &PgPool,
        tracking_token: Uuid,
    ) -> Result<Option<CampaignEmail>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swms_campaign_emails WHERE tracking_token = $1");
        sqlx::query_as::<_, CampaignEmail>(&query)
            .bind(tracking_token)
            .fetch_optional(pool)
            .await
    }

    /// Bump the open or click counter. Returns `false` for an unknown token.
    pub async fn record_engagement(
        pool: &PgPool,
        tracking_token: Uuid,
        kind: TrackingKind,
        occurred_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let sql = match kind {
            TrackingKind::Open => {
                "UPDATE swms_campaign_emails \
                 SET open_count = open_count + 1, \
                     first_opened_at = COALESCE(first_opened_at, $2), \
                     updated_at = NOW() \
                 WHERE tracking_token = $1"
            }
            TrackingKind::Click => {
                "UPDATE swms_campaign_emails \
                 SET click_count = click_count + 1, \
                     first_clicked_at = COALESCE(first_clicked_at, $2), \
                     updated_at = NOW() \
                 WHERE tracking_token = $1"
            }
        };
        let result = sqlx::query(sql)
            .bind(tracking_token)
            .bind(occurred_at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
