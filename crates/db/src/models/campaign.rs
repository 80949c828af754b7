//! SWMS campaign and campaign email models.

use serde::{Deserialize, Serialize};
use sitesafe_core::types::{Date, DbId, Timestamp};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `swms_campaigns` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SwmsCampaign {
    pub id: DbId,
    pub swms_job_id: DbId,
    pub campaign_type: String,
    pub status: String,
    pub scheduled_at: Option<Timestamp>,
    pub sent_at: Option<Timestamp>,
    pub total_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub skipped_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Aggregated per-run counts written back to a campaign row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CampaignTotals {
    pub total: i32,
    pub sent: i32,
    pub failed: i32,
    pub skipped: i32,
}

/// An `initial` campaign that has been sent, with the follow-up types that
/// already exist for its job.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SentInitialCampaign {
    pub swms_job_id: DbId,
    pub sent_at: Timestamp,
    pub due_date: Date,
    pub existing_types: Vec<String>,
}

/// A row from the `swms_campaign_emails` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CampaignEmail {
    pub id: DbId,
    pub campaign_id: DbId,
    pub contractor_id: DbId,
    pub recipient_email: String,
    pub subject: String,
    pub status: String,
    pub error_message: Option<String>,
    pub tracking_token: Uuid,
    pub portal_token_id: Option<DbId>,
    pub sent_at: Option<Timestamp>,
    pub open_count: i32,
    pub click_count: i32,
    pub first_opened_at: Option<Timestamp>,
    pub first_clicked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a campaign email before dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignEmail {
    pub campaign_id: DbId,
    pub contractor_id: DbId,
    pub recipient_email: String,
    pub subject: String,
    pub tracking_token: Uuid,
    pub portal_token_id: Option<DbId>,
}
