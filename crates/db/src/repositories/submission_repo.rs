//! Repository for the `swms_submissions` table.

use sitesafe_core::submission::SubmissionStatus;
use sitesafe_core::types::DbId;
use sqlx::PgPool;

use crate::models::submission::{ContractorCompliance, CreateSubmission, SwmsSubmission};

/// Column list for `swms_submissions` queries.
const COLUMNS: &str = "id, swms_job_id, contractor_id, status, file_ref, file_name, notes, \
    reviewer_notes, reviewed_at, submitted_at, created_at, updated_at";

pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Insert a new submission in the `submitted` state.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSubmission,
    ) -> Result<SwmsSubmission, sqlx::Error> {
        let query = format!(
            "INSERT INTO swms_submissions \
                 (swms_job_id, contractor_id, status, file_ref, file_name, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwmsSubmission>(&query)
            .bind(input.swms_job_id)
            .bind(input.contractor_id)
            .bind(SubmissionStatus::Submitted.as_str())
            .bind(&input.file_ref)
            .bind(&input.file_name)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SwmsSubmission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swms_submissions WHERE id = $1");
        sqlx::query_as::<_, SwmsSubmission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a submission to `new_status`, guarded on its current status so a
    /// concurrent review cannot be overwritten. Returns `None` when the row
    /// no longer has `expected_status`.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected_status: SubmissionStatus,
        new_status: SubmissionStatus,
        reviewer_notes: Option<&str>,
    ) -> Result<Option<SwmsSubmission>, sqlx::Error> {
        let query = format!(
            "UPDATE swms_submissions SET \
                 status = $3, \
                 reviewer_notes = COALESCE($4, reviewer_notes), \
                 reviewed_at = CASE WHEN $3 = 'submitted' THEN reviewed_at ELSE NOW() END, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwmsSubmission>(&query)
            .bind(id)
            .bind(expected_status.as_str())
            .bind(new_status.as_str())
            .bind(reviewer_notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn has_approved(
        pool: &PgPool,
        swms_job_id: DbId,
        contractor_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM swms_submissions \
                 WHERE swms_job_id = $1 AND contractor_id = $2 AND status = 'approved' \
             )",
        )
        .bind(swms_job_id)
        .bind(contractor_id)
        .fetch_one(pool)
        .await
    }

    /// Latest submission status for every contractor assigned to a job,
    /// `None` for contractors that have not submitted.
    pub async fn latest_statuses_for_job(
        pool: &PgPool,
        swms_job_id: DbId,
    ) -> Result<Vec<(DbId, Option<String>)>, sqlx::Error> {
        sqlx::query_as::<_, (DbId, Option<String>)>(
            "SELECT jc.contractor_id, latest.status \
             FROM swms_job_contractors jc \
             LEFT JOIN LATERAL ( \
                 SELECT s.status FROM swms_submissions s \
                 WHERE s.swms_job_id = jc.swms_job_id AND s.contractor_id = jc.contractor_id \
                 ORDER BY s.submitted_at DESC, s.id DESC \
                 LIMIT 1 \
             ) latest ON TRUE \
             WHERE jc.swms_job_id = $1 \
             ORDER BY jc.contractor_id",
        )
        .bind(swms_job_id)
        .fetch_all(pool)
        .await
    }

    /// One report line per assigned contractor: latest submission, last
    /// campaign email status and engagement totals for the job.
    pub async fn compliance_for_job(
        pool: &PgPool,
        swms_job_id: DbId,
    ) -> Result<Vec<ContractorCompliance>, sqlx::Error> {
        sqlx::query_as::<_, ContractorCompliance>(
            "SELECT c.id AS contractor_id, c.company_name, c.contact_name, c.email, \
                    latest.status AS latest_status, latest.submitted_at AS latest_submitted_at, \
                    last_email.status AS last_email_status, \
                    engagement.open_count, engagement.click_count \
             FROM swms_job_contractors jc \
             JOIN contractors c ON c.id = jc.contractor_id \
             LEFT JOIN LATERAL ( \
                 SELECT s.status, s.submitted_at FROM swms_submissions s \
                 WHERE s.swms_job_id = jc.swms_job_id AND s.contractor_id = jc.contractor_id \
                 ORDER BY s.submitted_at DESC, s.id DESC \
                 LIMIT 1 \
             ) latest ON TRUE \
             LEFT JOIN LATERAL ( \
                 SELECT e.status FROM swms_campaign_emails e \
                 JOIN swms_campaigns camp ON camp.id = e.campaign_id \
                 WHERE camp.swms_job_id = jc.swms_job_id AND e.contractor_id = jc.contractor_id \
                 ORDER BY e.created_at DESC, e.id DESC \
                 LIMIT 1 \
             ) last_email ON TRUE \
             CROSS JOIN LATERAL ( \
                 SELECT COALESCE(SUM(e.open_count), 0)::BIGINT AS open_count, \
                        COALESCE(SUM(e.click_count), 0)::BIGINT AS click_count \
                 FROM swms_campaign_emails e \
                 JOIN swms_campaigns camp ON camp.id = e.campaign_id \
                 WHERE camp.swms_job_id = jc.swms_job_id AND e.contractor_id = jc.contractor_id \
             ) engagement \
             WHERE jc.swms_job_id = $1 \
             ORDER BY c.company_name, c.id",
        )
        .bind(swms_job_id)
        .fetch_all(pool)
        .await
    }
}
