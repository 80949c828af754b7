//! Notification type names, audit results, delivery statuses and dedup keys.
//!
//! These strings must match the values stored in `notification_audit`,
//! `notification_dedup` and `swms_campaign_emails`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Date, DbId};

// ---------------------------------------------------------------------------
// Notification types
// ---------------------------------------------------------------------------

/// Batched certification expiry reminder (one audit row per worker).
pub const NOTIFICATION_CERT_EXPIRY: &str = "certification_expiry";

/// A single SWMS campaign email to one contractor.
pub const NOTIFICATION_SWMS_CAMPAIGN: &str = "swms_campaign";

/// Campaign-level aggregate written once per automation run.
pub const NOTIFICATION_SWMS_CAMPAIGN_SUMMARY: &str = "swms_campaign_summary";

/// Signed compliance alert forwarded to the automation platform.
pub const NOTIFICATION_COMPLIANCE_ALERT: &str = "compliance_alert";

// ---------------------------------------------------------------------------
// AuditResult
// ---------------------------------------------------------------------------

/// Outcome recorded in `notification_audit.result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failure,
    Skipped,
}

impl AuditResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Success => "success",
            AuditResult::Failure => "failure",
            AuditResult::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(AuditResult::Success),
            "failure" => Some(AuditResult::Failure),
            "skipped" => Some(AuditResult::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DeliveryStatus
// ---------------------------------------------------------------------------

/// Per-email delivery status in `swms_campaign_emails.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dedup keys
// ---------------------------------------------------------------------------

/// Dedup key for a worker's certification expiring on `expiry_date`.
pub fn worker_expiry_dedup_key(worker_id: DbId, expiry_date: Date) -> String {
    format!("worker:{worker_id}:expiry:{expiry_date}")
}

/// Dedup key for one contractor within one campaign.
pub fn campaign_dedup_key(contractor_id: DbId, campaign_id: DbId) -> String {
    format!("contractor:{contractor_id}:campaign:{campaign_id}")
}
