//! Repository for the `portal_tokens` table.

use sitesafe_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::portal_token::{CreatePortalToken, PortalAccess};

pub struct PortalTokenRepo;

impl PortalTokenRepo {
    pub async fn create(pool: &PgPool, input: &CreatePortalToken) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO portal_tokens (token, contractor_id, swms_job_id, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&input.token)
        .bind(input.contractor_id)
        .bind(input.swms_job_id)
        .bind(input.expires_at)
        .fetch_one(pool)
        .await
    }

    /// Resolve a token that has not expired at `now`.
    pub async fn find_access(
        pool: &PgPool,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<PortalAccess>, sqlx::Error> {
        sqlx::query_as::<_, PortalAccess>(
            "SELECT t.id AS token_id, t.contractor_id, c.company_name, c.contact_name, \
                    c.email AS contractor_email, t.swms_job_id, j.title AS job_title, \
                    j.due_date, s.name AS site_name, s.address AS site_address, t.expires_at \
             FROM portal_tokens t \
             JOIN contractors c ON c.id = t.contractor_id \
             JOIN swms_jobs j ON j.id = t.swms_job_id \
             JOIN job_sites s ON s.id = j.job_site_id \
             WHERE t.token = $1 AND t.expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(pool)
        .await
    }

    pub async fn touch(pool: &PgPool, id: DbId, used_at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE portal_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(used_at)
            .execute(pool)
            .await?;
        Ok(())
    }
}
