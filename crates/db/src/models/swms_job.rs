//! Job site and SWMS job models.

use serde::{Deserialize, Serialize};
use sitesafe_core::types::{Date, DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `job_sites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobSite {
    pub id: DbId,
    pub name: String,
    pub address: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `swms_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwmsJob {
    pub id: DbId,
    pub job_site_id: DbId,
    pub title: String,
    pub due_date: Date,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A SWMS job joined with its site, as needed for email rendering and reports.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SwmsJobDetail {
    pub id: DbId,
    pub title: String,
    pub due_date: Date,
    pub job_site_id: DbId,
    pub site_name: String,
    pub site_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobSite {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSwmsJob {
    pub job_site_id: DbId,
    pub title: String,
    pub due_date: Date,
}
