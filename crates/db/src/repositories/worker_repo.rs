//! Repository for the `workers` and `worker_certifications` tables.

use sitesafe_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::worker::{
    CreateCertification, CreateWorker, ExpiringCertification, Worker, WorkerCertification,
};

/// Column list for `workers` queries.
const COLUMNS: &str = "id, full_name, email, is_active, created_at, updated_at";

/// Column list for `worker_certifications` queries.
const CERT_COLUMNS: &str = "id, worker_id, certification_type, status, expiry_date, created_at";

pub struct WorkerRepo;

impl WorkerRepo {
    pub async fn create(pool: &PgPool, input: &CreateWorker) -> Result<Worker, sqlx::Error> {
        let query = format!(
            "INSERT INTO workers (full_name, email) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Worker>(&query)
            .bind(&input.full_name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE workers SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(is_active)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn add_certification(
        pool: &PgPool,
        input: &CreateCertification,
    ) -> Result<WorkerCertification, sqlx::Error> {
        let query = format!(
            "INSERT INTO worker_certifications (worker_id, certification_type, status, expiry_date) \
             VALUES ($1, $2, COALESCE($3, 'valid'), $4) \
             RETURNING {CERT_COLUMNS}"
        );
        sqlx::query_as::<_, WorkerCertification>(&query)
            .bind(input.worker_id)
            .bind(&input.certification_type)
            .bind(&input.status)
            .bind(input.expiry_date)
            .fetch_one(pool)
            .await
    }

    /// Active workers whose latest valid certification expires in `[start, end]`.
    ///
    /// "Latest" is the valid certification with the furthest expiry date, so a
    /// renewed certification hides the one it replaced.
    pub async fn list_expiring(
        pool: &PgPool,
        start: Date,
        end: Date,
    ) -> Result<Vec<ExpiringCertification>, sqlx::Error> {
        sqlx::query_as::<_, ExpiringCertification>(
            "SELECT worker_id, worker_name, worker_email, certification_id, \
                    certification_type, expiry_date \
             FROM ( \
                 SELECT DISTINCT ON (w.id) \
                        w.id AS worker_id, w.full_name AS worker_name, w.email AS worker_email, \
                        c.id AS certification_id, c.certification_type, c.expiry_date \
                 FROM workers w \
                 JOIN worker_certifications c ON c.worker_id = w.id \
                 WHERE w.is_active AND c.status = 'valid' \
                 ORDER BY w.id, c.expiry_date DESC, c.id DESC \
             ) latest \
             WHERE expiry_date BETWEEN $1 AND $2 \
             ORDER BY expiry_date, worker_id",
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }
}
