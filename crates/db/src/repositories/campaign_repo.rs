//! Repository for the `swms_campaigns` table.

use sitesafe_core::campaign::{status, CampaignType};
use sitesafe_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::campaign::{CampaignTotals, SentInitialCampaign, SwmsCampaign};

/// Column list for `swms_campaigns` queries.
const COLUMNS: &str = "id, swms_job_id, campaign_type, status, scheduled_at, sent_at, \
    total_count, sent_count, failed_count, skipped_count, created_at, updated_at";

pub struct CampaignRepo;

impl CampaignRepo {
    /// Return the campaign for `(job, type)`, creating it when absent.
    pub async fn find_or_create(
        pool: &PgPool,
        swms_job_id: DbId,
        campaign_type: CampaignType,
    ) -> Result<SwmsCampaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO swms_campaigns (swms_job_id, campaign_type) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_swms_campaigns_job_type \
             DO UPDATE SET updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwmsCampaign>(&query)
            .bind(swms_job_id)
            .bind(campaign_type.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SwmsCampaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swms_campaigns WHERE id = $1");
        sqlx::query_as::<_, SwmsCampaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_job(
        pool: &PgPool,
        swms_job_id: DbId,
    ) -> Result<Vec<SwmsCampaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM swms_campaigns \
             WHERE swms_job_id = $1 \
             ORDER BY scheduled_at NULLS FIRST, id"
        );
        sqlx::query_as::<_, SwmsCampaign>(&query)
            .bind(swms_job_id)
            .fetch_all(pool)
            .await
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        new_status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE swms_campaigns SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(new_status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Write the outcome of an automation run. `sent_at` is stamped only
    /// when at least one email went out.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        new_status: &str,
        totals: &CampaignTotals,
    ) -> Result<SwmsCampaign, sqlx::Error> {
        let query = format!(
            "UPDATE swms_campaigns SET \
                 status = $2, \
                 total_count = $3, \
                 sent_count = $4, \
                 failed_count = $5, \
                 skipped_count = $6, \
                 sent_at = CASE WHEN $4 > 0 THEN NOW() ELSE sent_at END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwmsCampaign>(&query)
            .bind(id)
            .bind(new_status)
            .bind(totals.total)
            .bind(totals.sent)
            .bind(totals.failed)
            .bind(totals.skipped)
            .fetch_one(pool)
            .await
    }

    /// Scheduled campaigns whose `scheduled_at` has passed.
    pub async fn list_due(pool: &PgPool, now: Timestamp) -> Result<Vec<SwmsCampaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM swms_campaigns \
             WHERE status = $1 AND scheduled_at IS NOT NULL AND scheduled_at <= $2 \
             ORDER BY scheduled_at, id"
        );
        sqlx::query_as::<_, SwmsCampaign>(&query)
            .bind(status::SCHEDULED)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Every sent `initial` campaign with the follow-up types its job already has.
    pub async fn list_sent_initials(pool: &PgPool) -> Result<Vec<SentInitialCampaign>, sqlx::Error> {
        sqlx::query_as::<_, SentInitialCampaign>(
            "SELECT c.swms_job_id, c.sent_at, j.due_date, \
                    COALESCE( \
                        ARRAY_AGG(f.campaign_type) FILTER (WHERE f.campaign_type IS NOT NULL), \
                        '{}'::TEXT[] \
                    ) AS existing_types \
             FROM swms_campaigns c \
             JOIN swms_jobs j ON j.id = c.swms_job_id \
             LEFT JOIN swms_campaigns f \
                    ON f.swms_job_id = c.swms_job_id AND f.campaign_type <> 'initial' \
             WHERE c.campaign_type = 'initial' AND c.sent_at IS NOT NULL \
             GROUP BY c.swms_job_id, c.sent_at, j.due_date \
             ORDER BY c.swms_job_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Insert a `scheduled` follow-up. Returns `false` when one already exists.
    pub async fn insert_scheduled(
        pool: &PgPool,
        swms_job_id: DbId,
        campaign_type: CampaignType,
        scheduled_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO swms_campaigns (swms_job_id, campaign_type, status, scheduled_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_swms_campaigns_job_type DO NOTHING",
        )
        .bind(swms_job_id)
        .bind(campaign_type.as_str())
        .bind(status::SCHEDULED)
        .bind(scheduled_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
