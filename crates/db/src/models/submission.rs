//! SWMS submission models.

use serde::{Deserialize, Serialize};
use sitesafe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `swms_submissions` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SwmsSubmission {
    pub id: DbId,
    pub swms_job_id: DbId,
    pub contractor_id: DbId,
    pub status: String,
    pub file_ref: String,
    pub file_name: String,
    pub notes: Option<String>,
    pub reviewer_notes: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub submitted_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubmission {
    pub swms_job_id: DbId,
    pub contractor_id: DbId,
    pub file_ref: String,
    pub file_name: String,
    pub notes: Option<String>,
}

/// DTO for a reviewer moving a submission to a new status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubmissionStatus {
    pub status: String,
    pub reviewer_notes: Option<String>,
}

/// One assigned contractor's compliance position on a job.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ContractorCompliance {
    pub contractor_id: DbId,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub latest_status: Option<String>,
    pub latest_submitted_at: Option<Timestamp>,
    pub last_email_status: Option<String>,
    pub open_count: i64,
    pub click_count: i64,
}
