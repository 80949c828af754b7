//! Contractor models.

use serde::{Deserialize, Serialize};
use sitesafe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `contractors` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Contractor {
    pub id: DbId,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContractor {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
}
