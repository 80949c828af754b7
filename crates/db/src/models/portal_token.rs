//! Contractor portal token models.

use serde::{Deserialize, Serialize};
use sitesafe_core::types::{Date, DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `portal_tokens` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PortalTokenRow {
    pub id: DbId,
    pub token: String,
    pub contractor_id: DbId,
    pub swms_job_id: DbId,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePortalToken {
    pub token: String,
    pub contractor_id: DbId,
    pub swms_job_id: DbId,
    pub expires_at: Timestamp,
}

/// What a portal token grants access to: one contractor on one job.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PortalAccess {
    pub token_id: DbId,
    pub contractor_id: DbId,
    pub company_name: String,
    pub contact_name: String,
    pub contractor_email: String,
    pub swms_job_id: DbId,
    pub job_title: String,
    pub due_date: Date,
    pub site_name: String,
    pub site_address: String,
    pub expires_at: Timestamp,
}
