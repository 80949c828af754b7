//! Repository for `contractors` and their job assignments.

use sitesafe_core::types::DbId;
use sqlx::PgPool;

use crate::models::contractor::{Contractor, CreateContractor};

/// Column list for `contractors` queries.
const COLUMNS: &str = "id, company_name, contact_name, email, created_at, updated_at";

pub struct ContractorRepo;

impl ContractorRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateContractor,
    ) -> Result<Contractor, sqlx::Error> {
        let query = format!(
            "INSERT INTO contractors (company_name, contact_name, email) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contractor>(&query)
            .bind(&input.company_name)
            .bind(&input.contact_name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Contractor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contractors WHERE id = $1");
        sqlx::query_as::<_, Contractor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Assign a contractor to a job. Re-assigning is a no-op.
    pub async fn assign_to_job(
        pool: &PgPool,
        swms_job_id: DbId,
        contractor_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO swms_job_contractors (swms_job_id, contractor_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(swms_job_id)
        .bind(contractor_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Contractors assigned to a job that have no approved submission for it.
    pub async fn list_pending_for_job(
        pool: &PgPool,
        swms_job_id: DbId,
    ) -> Result<Vec<Contractor>, sqlx::Error> {
        sqlx::query_as::<_, Contractor>(
            "SELECT c.id, c.company_name, c.contact_name, c.email, c.created_at, c.updated_at \
             FROM contractors c \
             JOIN swms_job_contractors jc ON jc.contractor_id = c.id \
             WHERE jc.swms_job_id = $1 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM swms_submissions s \
                   WHERE s.swms_job_id = jc.swms_job_id \
                     AND s.contractor_id = c.id \
                     AND s.status = 'approved' \
               ) \
             ORDER BY c.id",
        )
        .bind(swms_job_id)
        .fetch_all(pool)
        .await
    }
}
