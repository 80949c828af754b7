//! Repository for the `swms_jobs` table.

use sitesafe_core::types::DbId;
use sqlx::PgPool;

use crate::models::swms_job::{CreateSwmsJob, SwmsJob, SwmsJobDetail};

/// Column list for `swms_jobs` queries.
const COLUMNS: &str = "id, job_site_id, title, due_date, created_at, updated_at";

pub struct SwmsJobRepo;

impl SwmsJobRepo {
    pub async fn create(pool: &PgPool, input: &CreateSwmsJob) -> Result<SwmsJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO swms_jobs (job_site_id, title, due_date) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwmsJob>(&query)
            .bind(input.job_site_id)
            .bind(&input.title)
            .bind(input.due_date)
            .fetch_one(pool)
            .await
    }

    /// Load a job together with its site.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SwmsJobDetail>, sqlx::Error> {
        sqlx::query_as::<_, SwmsJobDetail>(
            "SELECT j.id, j.title, j.due_date, j.job_site_id, \
                    s.name AS site_name, s.address AS site_address \
             FROM swms_jobs j \
             JOIN job_sites s ON s.id = j.job_site_id \
             WHERE j.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
