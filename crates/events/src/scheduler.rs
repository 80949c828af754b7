//! Follow-up campaign scheduling and the periodic reminder scan.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sitesafe_core::campaign::{follow_up_date, status, CampaignType};
use sitesafe_core::notification::{AuditResult, NOTIFICATION_SWMS_CAMPAIGN_SUMMARY};
use sitesafe_core::report::is_fully_submitted;
use sitesafe_core::submission::SubmissionStatus;
use sitesafe_core::types::{Date, DbId, Timestamp};
use sitesafe_db::models::campaign::SwmsCampaign;
use sitesafe_db::models::notification::CreateAudit;

use crate::campaign::{CampaignAutomation, CampaignRequest};
use crate::error::NotifyError;
use crate::store::{record_audit, NotificationStore};

/// Insert every follow-up campaign the job does not have yet.
///
/// `existing_types` lists campaign types already present for the job; the
/// store also refuses duplicates. Returns how many rows were created.
pub async fn schedule_follow_ups(
    store: &dyn NotificationStore,
    swms_job_id: DbId,
    initial_sent_at: Timestamp,
    due_date: Date,
    existing_types: &[String],
) -> Result<u32, NotifyError> {
    let mut scheduled = 0;
    for campaign_type in CampaignType::FOLLOW_UPS {
        if existing_types.iter().any(|t| t == campaign_type.as_str()) {
            continue;
        }
        let Some(at) = follow_up_date(campaign_type, initial_sent_at, due_date) else {
            continue;
        };
        if store.schedule_campaign(swms_job_id, campaign_type, at).await? {
            tracing::debug!(
                swms_job_id,
                campaign_type = %campaign_type,
                scheduled_at = %at,
                "Follow-up campaign scheduled"
            );
            scheduled += 1;
        }
    }
    Ok(scheduled)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderScanResult {
    pub follow_ups_scheduled: u32,
    pub due: u32,
    pub processed: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Runs due follow-up campaigns. Invoked externally (cron or the worker CLI).
pub struct ReminderScheduler {
    store: Arc<dyn NotificationStore>,
    automation: Arc<CampaignAutomation>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<dyn NotificationStore>, automation: Arc<CampaignAutomation>) -> Self {
        Self { store, automation }
    }

    pub async fn run(&self) -> Result<ReminderScanResult, NotifyError> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: Timestamp) -> Result<ReminderScanResult, NotifyError> {
        let mut result = ReminderScanResult::default();

        for initial in self.store.sent_initial_campaigns().await? {
            result.follow_ups_scheduled += schedule_follow_ups(
                self.store.as_ref(),
                initial.swms_job_id,
                initial.sent_at,
                initial.due_date,
                &initial.existing_types,
            )
            .await?;
        }

        let due = self.store.due_campaigns(now).await?;
        result.due = due.len() as u32;

        for campaign in &due {
            let campaign_type: CampaignType = match campaign.campaign_type.parse() {
                Ok(t) => t,
                Err(e) => {
                    result.failed += 1;
                    self.fail(campaign, &e.to_string()).await;
                    continue;
                }
            };

            if self.job_fully_submitted(campaign.swms_job_id).await? {
                result.skipped += 1;
                self.store
                    .set_campaign_status(campaign.id, status::SKIPPED)
                    .await?;
                record_audit(
                    self.store.as_ref(),
                    summary_audit(campaign, AuditResult::Skipped).details(serde_json::json!({
                        "campaign_type": campaign_type,
                        "reason": "all contractors submitted",
                    })),
                )
                .await;
                continue;
            }

            let request = CampaignRequest::new(campaign.swms_job_id, campaign_type);
            match self.automation.run_at(&request, now).await {
                Ok(_) => result.processed += 1,
                Err(e) => {
                    result.failed += 1;
                    self.fail(campaign, &e.to_string()).await;
                }
            }
        }

        tracing::info!(
            follow_ups_scheduled = result.follow_ups_scheduled,
            due = result.due,
            processed = result.processed,
            skipped = result.skipped,
            failed = result.failed,
            "Reminder scan complete"
        );
        Ok(result)
    }

    /// A job with no assigned contractors is not treated as submitted.
    async fn job_fully_submitted(&self, swms_job_id: DbId) -> Result<bool, NotifyError> {
        let statuses = self.store.latest_submission_statuses(swms_job_id).await?;
        Ok(is_fully_submitted(statuses.into_iter().map(|(_, s)| {
            s.and_then(|s| s.parse::<SubmissionStatus>().ok())
        })))
    }

    /// Mark a campaign failed and record why. Errors here are logged only.
    async fn fail(&self, campaign: &SwmsCampaign, message: &str) {
        tracing::error!(
            campaign_id = campaign.id,
            swms_job_id = campaign.swms_job_id,
            error = %message,
            "Scheduled campaign failed"
        );
        if let Err(e) = self
            .store
            .set_campaign_status(campaign.id, status::FAILED)
            .await
        {
            tracing::warn!(campaign_id = campaign.id, error = %e, "Failed to mark campaign failed");
        }
        record_audit(
            self.store.as_ref(),
            summary_audit(campaign, AuditResult::Failure)
                .error(message.to_string())
                .details(serde_json::json!({ "campaign_type": campaign.campaign_type })),
        )
        .await;
    }
}

fn summary_audit(campaign: &SwmsCampaign, result: AuditResult) -> CreateAudit {
    CreateAudit::new(NOTIFICATION_SWMS_CAMPAIGN_SUMMARY, result)
        .job(campaign.swms_job_id)
        .campaign(campaign.id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
