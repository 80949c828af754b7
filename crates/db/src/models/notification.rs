//! Notification dedup and audit models.

use serde::{Deserialize, Serialize};
use sitesafe_core::notification::AuditResult;
use sitesafe_core::types::{Date, DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `notification_dedup` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationDedup {
    pub id: DbId,
    pub dedup_key: String,
    pub notification_type: String,
    pub worker_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub expiry_date: Option<Date>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDedup {
    pub dedup_key: String,
    pub notification_type: String,
    pub worker_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub expiry_date: Option<Date>,
}

impl CreateDedup {
    pub fn for_worker(
        dedup_key: String,
        notification_type: &str,
        worker_id: DbId,
        expiry_date: Date,
    ) -> Self {
        Self {
            dedup_key,
            notification_type: notification_type.to_string(),
            worker_id: Some(worker_id),
            contractor_id: None,
            campaign_id: None,
            expiry_date: Some(expiry_date),
        }
    }

    pub fn for_contractor(
        dedup_key: String,
        notification_type: &str,
        contractor_id: DbId,
        campaign_id: DbId,
    ) -> Self {
        Self {
            dedup_key,
            notification_type: notification_type.to_string(),
            worker_id: None,
            contractor_id: Some(contractor_id),
            campaign_id: Some(campaign_id),
            expiry_date: None,
        }
    }
}

/// A row from the append-only `notification_audit` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct NotificationAudit {
    pub id: DbId,
    pub notification_type: String,
    pub result: String,
    pub recipient: Option<String>,
    pub worker_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub swms_job_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub error_message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Audit row under construction.
///
/// ```ignore
/// let audit = CreateAudit::new(NOTIFICATION_SWMS_CAMPAIGN, AuditResult::Failure)
///     .recipient("ops@example.com")
///     .contractor(contractor.id)
///     .error("HTTP 502");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAudit {
    pub notification_type: String,
    pub result: AuditResult,
    pub recipient: Option<String>,
    pub worker_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub swms_job_id: Option<DbId>,
    pub campaign_id: Option<DbId>,
    pub error_message: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl CreateAudit {
    pub fn new(notification_type: &str, result: AuditResult) -> Self {
        Self {
            notification_type: notification_type.to_string(),
            result,
            recipient: None,
            worker_id: None,
            contractor_id: None,
            swms_job_id: None,
            campaign_id: None,
            error_message: None,
            details: None,
        }
    }

    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn worker(mut self, worker_id: DbId) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    pub fn contractor(mut self, contractor_id: DbId) -> Self {
        self.contractor_id = Some(contractor_id);
        self
    }

    pub fn job(mut self, swms_job_id: DbId) -> Self {
        self.swms_job_id = Some(swms_job_id);
        self
    }

    pub fn campaign(mut self, campaign_id: DbId) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Filters for listing audit rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub notification_type: Option<String>,
    pub result: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
