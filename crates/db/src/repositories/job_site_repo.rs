//! Repository for the `job_sites` table.

use sqlx::PgPool;

use crate::models::swms_job::{CreateJobSite, JobSite};

/// Column list for `job_sites` queries.
const COLUMNS: &str = "id, name, address, created_at, updated_at";

pub struct JobSiteRepo;

impl JobSiteRepo {
    pub async fn create(pool: &PgPool, input: &CreateJobSite) -> Result<JobSite, sqlx::Error> {
        let query =
            format!("INSERT INTO job_sites (name, address) VALUES ($1, $2) RETURNING {COLUMNS}");
        sqlx::query_as::<_, JobSite>(&query)
            .bind(&input.name)
            .bind(&input.address)
            .fetch_one(pool)
            .await
    }
}
