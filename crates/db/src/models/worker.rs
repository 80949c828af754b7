//! Worker and certification models.

use serde::{Deserialize, Serialize};
use sitesafe_core::types::{Date, DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `workers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Worker {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `worker_certifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkerCertification {
    pub id: DbId,
    pub worker_id: DbId,
    pub certification_type: String,
    pub status: String,
    pub expiry_date: Date,
    pub created_at: Timestamp,
}

/// A worker joined with their latest valid certification.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ExpiringCertification {
    pub worker_id: DbId,
    pub worker_name: String,
    pub worker_email: String,
    pub certification_id: DbId,
    pub certification_type: String,
    pub expiry_date: Date,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorker {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCertification {
    pub worker_id: DbId,
    pub certification_type: String,
    /// Defaults to `valid`.
    pub status: Option<String>,
    pub expiry_date: Date,
}
