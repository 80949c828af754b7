//! SWMS email campaign automation.
//!
//! One run sends a campaign of a given type for a job to every assigned
//! contractor that has no approved submission yet. Each email carries a fresh
//! portal link and an open-tracking pixel. Contractors emailed for the same
//! campaign in the last 24 hours are skipped; the dedup row is written only
//! after a successful send.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sitesafe_core::campaign::{
    days_remaining, status, summary_status, CampaignType, CAMPAIGN_DEDUP_COOLDOWN_HOURS,
};
use sitesafe_core::error::CoreError;
use sitesafe_core::notification::{
    campaign_dedup_key, AuditResult, NOTIFICATION_SWMS_CAMPAIGN,
    NOTIFICATION_SWMS_CAMPAIGN_SUMMARY,
};
use sitesafe_core::portal_token::{generate_portal_token, portal_url};
use sitesafe_core::template::{default_template, RenderedEmail, TemplateVars};
use sitesafe_core::tracking::pixel_url;
use sitesafe_core::types::{DbId, Timestamp};
use sitesafe_db::models::campaign::{CampaignTotals, CreateCampaignEmail};
use sitesafe_db::models::contractor::Contractor;
use sitesafe_db::models::notification::{CreateAudit, CreateDedup};
use sitesafe_db::models::portal_token::CreatePortalToken;
use sitesafe_db::models::swms_job::SwmsJobDetail;
use uuid::Uuid;

use crate::delivery::email::{Mailer, OutboundEmail};
use crate::error::NotifyError;
use crate::scheduler::schedule_follow_ups;
use crate::store::{record_audit, NotificationStore};

/// Placeholder token used for links in test-mode previews.
const PREVIEW_TOKEN: &str = "preview";

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignRequest {
    pub swms_job_id: DbId,
    pub campaign_type: String,
    /// Render previews only; nothing is sent or persisted except one audit row.
    #[serde(default)]
    pub test_mode: bool,
}

impl CampaignRequest {
    pub fn new(swms_job_id: DbId, campaign_type: CampaignType) -> Self {
        Self {
            swms_job_id,
            campaign_type: campaign_type.as_str().to_string(),
            test_mode: false,
        }
    }

    fn validate(&self) -> Result<CampaignType, CoreError> {
        if self.swms_job_id <= 0 {
            return Err(CoreError::Validation(
                "swms_job_id must be a positive integer".to_string(),
            ));
        }
        self.campaign_type.trim().parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailPreview {
    pub contractor_id: DbId,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignRunResult {
    /// `None` for test-mode runs, which never create a campaign row.
    pub campaign_id: Option<DbId>,
    pub campaign_type: CampaignType,
    pub status: String,
    pub total: u32,
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    pub follow_ups_scheduled: u32,
    pub test_mode: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previews: Vec<EmailPreview>,
}

// ---------------------------------------------------------------------------
// CampaignAutomation
// ---------------------------------------------------------------------------

/// Link bases embedded in campaign emails.
#[derive(Debug, Clone)]
pub struct CampaignLinks {
    pub public_base_url: String,
    pub portal_base_url: String,
}

pub struct CampaignAutomation {
    store: Arc<dyn NotificationStore>,
    mailer: Arc<dyn Mailer>,
    links: CampaignLinks,
}

impl CampaignAutomation {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        mailer: Arc<dyn Mailer>,
        links: CampaignLinks,
    ) -> Self {
        Self {
            store,
            mailer,
            links,
        }
    }

    pub async fn run(&self, request: &CampaignRequest) -> Result<CampaignRunResult, NotifyError> {
        self.run_at(request, Utc::now()).await
    }

    pub async fn run_at(
        &self,
        request: &CampaignRequest,
        now: Timestamp,
    ) -> Result<CampaignRunResult, NotifyError> {
        let campaign_type = request.validate()?;
        let job = self
            .store
            .find_job(request.swms_job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "swms_job",
                id: request.swms_job_id,
            })?;
        let contractors = self.store.pending_contractors(job.id).await?;

        if request.test_mode {
            return Ok(self.preview(&job, campaign_type, &contractors, now).await);
        }

        let campaign = self
            .store
            .find_or_create_campaign(job.id, campaign_type)
            .await?;
        self.store
            .set_campaign_status(campaign.id, status::SENDING)
            .await?;

        let cooldown_start = now - Duration::hours(CAMPAIGN_DEDUP_COOLDOWN_HOURS);
        let (mut sent, mut failed, mut skipped) = (0u32, 0u32, 0u32);

        for contractor in &contractors {
            let attempt = ContractorAttempt {
                job: &job,
                campaign_id: campaign.id,
                campaign_type,
                contractor,
            };
            match self.deliver(&attempt, cooldown_start, now).await {
                Ok(Outcome::Sent) => sent += 1,
                Ok(Outcome::Failed) => failed += 1,
                Ok(Outcome::Skipped) => skipped += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        campaign_id = campaign.id,
                        contractor_id = contractor.id,
                        error = %e,
                        "Campaign email could not be prepared"
                    );
                    record_audit(
                        self.store.as_ref(),
                        contractor_audit(contractor, &job, campaign.id, AuditResult::Failure)
                            .error(e.to_string()),
                    )
                    .await;
                }
            }
        }

        let totals = CampaignTotals {
            total: contractors.len() as i32,
            sent: sent as i32,
            failed: failed as i32,
            skipped: skipped as i32,
        };
        let final_status = summary_status(sent, failed);
        let finished = self
            .store
            .finish_campaign(campaign.id, final_status, &totals)
            .await;

        let summary_result = if failed == 0 {
            AuditResult::Success
        } else {
            AuditResult::Failure
        };
        record_audit(
            self.store.as_ref(),
            CreateAudit::new(NOTIFICATION_SWMS_CAMPAIGN_SUMMARY, summary_result)
                .job(job.id)
                .campaign(campaign.id)
                .details(serde_json::json!({
                    "campaign_type": campaign_type,
                    "status": final_status,
                    "total": totals.total,
                    "sent": sent,
                    "failed": failed,
                    "skipped": skipped,
                })),
        )
        .await;
        finished?;

        let mut follow_ups_scheduled = 0;
        if campaign_type == CampaignType::Initial && sent > 0 {
            follow_ups_scheduled =
                schedule_follow_ups(self.store.as_ref(), job.id, now, job.due_date, &[]).await?;
        }

        tracing::info!(
            campaign_id = campaign.id,
            campaign_type = %campaign_type,
            sent,
            failed,
            skipped,
            follow_ups_scheduled,
            "SWMS campaign run complete"
        );

        Ok(CampaignRunResult {
            campaign_id: Some(campaign.id),
            campaign_type,
            status: final_status.to_string(),
            total: contractors.len() as u32,
            sent,
            failed,
            skipped,
            follow_ups_scheduled,
            test_mode: false,
            previews: Vec::new(),
        })
    }

    /// One contractor's email. Store errors before the send abort the
    /// attempt; store errors after it are logged and do not change the outcome.
    async fn deliver(
        &self,
        attempt: &ContractorAttempt<'_>,
        cooldown_start: Timestamp,
        now: Timestamp,
    ) -> Result<Outcome, NotifyError> {
        let ContractorAttempt {
            job,
            campaign_id,
            campaign_type,
            contractor,
        } = *attempt;

        let key = campaign_dedup_key(contractor.id, campaign_id);
        if self
            .store
            .dedup_exists_since(&key, NOTIFICATION_SWMS_CAMPAIGN, cooldown_start)
            .await?
        {
            record_audit(
                self.store.as_ref(),
                contractor_audit(contractor, job, campaign_id, AuditResult::Skipped)
                    .details(serde_json::json!({ "reason": "already emailed within cooldown" })),
            )
            .await;
            return Ok(Outcome::Skipped);
        }

        let portal = generate_portal_token(now);
        let portal_token_id = self
            .store
            .create_portal_token(&CreatePortalToken {
                token: portal.token.clone(),
                contractor_id: contractor.id,
                swms_job_id: job.id,
                expires_at: portal.expires_at,
            })
            .await?;
        let tracking_token = Uuid::new_v4();

        let rendered = self.render(
            job,
            campaign_type,
            contractor,
            &portal.token,
            &tracking_token.to_string(),
            now,
        );

        let email_id = self
            .store
            .create_campaign_email(&CreateCampaignEmail {
                campaign_id,
                contractor_id: contractor.id,
                recipient_email: contractor.email.clone(),
                subject: rendered.subject.clone(),
                tracking_token,
                portal_token_id: Some(portal_token_id),
            })
            .await?;

        let outbound = OutboundEmail {
            to: contractor.email.clone(),
            subject: rendered.subject,
            html: rendered.body,
            metadata: serde_json::json!({
                "campaign_id": campaign_id,
                "campaign_type": campaign_type,
                "swms_job_id": job.id,
                "contractor_id": contractor.id,
                "tracking_token": tracking_token,
            }),
        };

        match self.mailer.send(&outbound).await {
            Ok(()) => {
                if let Err(e) = self.store.mark_email_sent(email_id, now).await {
                    tracing::warn!(email_id, error = %e, "Failed to mark campaign email sent");
                }
                let dedup = CreateDedup::for_contractor(
                    key,
                    NOTIFICATION_SWMS_CAMPAIGN,
                    contractor.id,
                    campaign_id,
                );
                if let Err(e) = self.store.insert_dedup(&dedup).await {
                    tracing::warn!(email_id, error = %e, "Failed to record campaign dedup");
                }
                record_audit(
                    self.store.as_ref(),
                    contractor_audit(contractor, job, campaign_id, AuditResult::Success)
                        .details(serde_json::json!({ "email_id": email_id })),
                )
                .await;
                Ok(Outcome::Sent)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(
                    campaign_id,
                    contractor_id = contractor.id,
                    error = %message,
                    "Campaign email failed"
                );
                if let Err(e) = self.store.mark_email_failed(email_id, &message).await {
                    tracing::warn!(email_id, error = %e, "Failed to mark campaign email failed");
                }
                record_audit(
                    self.store.as_ref(),
                    contractor_audit(contractor, job, campaign_id, AuditResult::Failure)
                        .error(message)
                        .details(serde_json::json!({ "email_id": email_id })),
                )
                .await;
                Ok(Outcome::Failed)
            }
        }
    }

    async fn preview(
        &self,
        job: &SwmsJobDetail,
        campaign_type: CampaignType,
        contractors: &[Contractor],
        now: Timestamp,
    ) -> CampaignRunResult {
        let previews: Vec<EmailPreview> = contractors
            .iter()
            .map(|contractor| {
                let rendered =
                    self.render(job, campaign_type, contractor, PREVIEW_TOKEN, PREVIEW_TOKEN, now);
                EmailPreview {
                    contractor_id: contractor.id,
                    to: contractor.email.clone(),
                    subject: rendered.subject,
                    body: rendered.body,
                }
            })
            .collect();

        record_audit(
            self.store.as_ref(),
            CreateAudit::new(NOTIFICATION_SWMS_CAMPAIGN_SUMMARY, AuditResult::Skipped)
                .job(job.id)
                .details(serde_json::json!({
                    "campaign_type": campaign_type,
                    "test_mode": true,
                    "previews": previews.len(),
                })),
        )
        .await;

        CampaignRunResult {
            campaign_id: None,
            campaign_type,
            status: status::SKIPPED.to_string(),
            total: contractors.len() as u32,
            sent: 0,
            failed: 0,
            skipped: 0,
            follow_ups_scheduled: 0,
            test_mode: true,
            previews,
        }
    }

    fn render(
        &self,
        job: &SwmsJobDetail,
        campaign_type: CampaignType,
        contractor: &Contractor,
        portal_token: &str,
        tracking_token: &str,
        now: Timestamp,
    ) -> RenderedEmail {
        let vars = TemplateVars::new()
            .with("contractor_name", &contractor.contact_name)
            .with("company_name", &contractor.company_name)
            .with("job_title", &job.title)
            .with("site_name", &job.site_name)
            .with("site_address", &job.site_address)
            .with("due_date", job.due_date.format("%d %B %Y"))
            .with("days_remaining", days_remaining(job.due_date, now))
            .with(
                "portal_url",
                portal_url(&self.links.portal_base_url, portal_token),
            )
            .with(
                "tracking_pixel_url",
                pixel_url(&self.links.public_base_url, tracking_token),
            )
            .with("campaign_label", campaign_type.label());
        default_template(campaign_type).render(&vars)
    }
}

#[derive(Clone, Copy)]
struct ContractorAttempt<'a> {
    job: &'a SwmsJobDetail,
    campaign_id: DbId,
    campaign_type: CampaignType,
    contractor: &'a Contractor,
}

enum Outcome {
    Sent,
    Failed,
    Skipped,
}

fn contractor_audit(
    contractor: &Contractor,
    job: &SwmsJobDetail,
    campaign_id: DbId,
    result: AuditResult,
) -> CreateAudit {
    CreateAudit::new(NOTIFICATION_SWMS_CAMPAIGN, result)
        .recipient(contractor.email.clone())
        .contractor(contractor.id)
        .job(job.id)
        .campaign(campaign_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use sitesafe_core::submission::SubmissionStatus;

    use super::*;
    use crate::delivery::email::EmailError;
    use crate::store::MemoryStore;

    /// Records every email; fails for recipients listed in `reject`.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
        reject: Vec<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError> {
            if self.reject.contains(&email.to) {
                return Err(EmailError::Build("mailbox unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        mailer: Arc<RecordingMailer>,
        automation: CampaignAutomation,
        job: SwmsJobDetail,
    }

    fn fixture(reject: &[&str]) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            reject: reject.iter().map(|s| s.to_string()).collect(),
        });
        let due = Utc::now().date_naive() + Duration::days(30);
        let job = store.add_job("Level 4 formwork", due, "Harbour Tower", "1 Quay St");
        let automation = CampaignAutomation::new(
            store.clone(),
            mailer.clone(),
            CampaignLinks {
                public_base_url: "https://api.sitesafe.test".to_string(),
                portal_base_url: "https://sitesafe.test/portal".to_string(),
            },
        );
        Fixture {
            store,
            mailer,
            automation,
            job,
        }
    }

    fn add_contractor(f: &Fixture, company: &str) -> Contractor {
        let contractor = f.store.add_contractor(
            company,
            &format!("{company} Lead"),
            &format!("{}@example.com", company.to_lowercase()),
        );
        f.store.assign(f.job.id, contractor.id);
        contractor
    }

    #[tokio::test]
    async fn sends_to_pending_contractors_only() {
        let f = fixture(&[]);
        let pending = add_contractor(&f, "Acme");
        let approved = add_contractor(&f, "Bolt");
        f.store
            .add_submission(f.job.id, approved.id, SubmissionStatus::Approved);

        let result = f
            .automation
            .run(&CampaignRequest::new(f.job.id, CampaignType::Reminder7))
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.sent, 1);
        assert_eq!(result.status, "sent");

        let sent = f.mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, pending.email);
        assert_eq!(
            sent[0].subject,
            "SWMS reminder: Level 4 formwork (Harbour Tower)"
        );
        assert!(sent[0].html.contains("Hi Acme Lead"));
        assert!(sent[0].html.contains("https://sitesafe.test/portal/"));
        assert!(sent[0].html.contains("https://api.sitesafe.test/api/v1/track/open/"));
        assert!(!sent[0].html.contains("{{"));

        let emails = f.store.emails();
        assert_eq!(emails[0].status, "sent");
        assert_eq!(f.store.portal_tokens().len(), 1);
        assert_eq!(f.store.dedups().len(), 1);

        let campaign = &f.store.campaigns()[0];
        assert_eq!(campaign.status, "sent");
        assert_eq!(campaign.sent_count, 1);
    }

    #[tokio::test]
    async fn second_run_within_cooldown_skips() {
        let f = fixture(&[]);
        add_contractor(&f, "Acme");
        let request = CampaignRequest::new(f.job.id, CampaignType::Reminder14);

        f.automation.run(&request).await.unwrap();
        let again = f.automation.run(&request).await.unwrap();

        assert_eq!(again.sent, 0);
        assert_eq!(again.skipped, 1);
        assert_eq!(f.mailer.sent.lock().unwrap().len(), 1);
        let skipped = f
            .store
            .audits()
            .into_iter()
            .filter(|a| a.notification_type == NOTIFICATION_SWMS_CAMPAIGN && a.result == "skipped")
            .count();
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn partial_failure_is_recorded_without_dedup() {
        let f = fixture(&["bolt@example.com"]);
        add_contractor(&f, "Acme");
        add_contractor(&f, "Bolt");

        let result = f
            .automation
            .run(&CampaignRequest::new(f.job.id, CampaignType::Final21))
            .await
            .unwrap();

        assert_eq!((result.sent, result.failed), (1, 1));
        assert_eq!(result.status, "partial");
        assert_eq!(f.store.dedups().len(), 1);

        let failed_email = f
            .store
            .emails()
            .into_iter()
            .find(|e| e.recipient_email == "bolt@example.com")
            .unwrap();
        assert_eq!(failed_email.status, "failed");
        assert!(failed_email
            .error_message
            .unwrap()
            .contains("mailbox unavailable"));

        let summary = f
            .store
            .audits()
            .into_iter()
            .find(|a| a.notification_type == NOTIFICATION_SWMS_CAMPAIGN_SUMMARY)
            .unwrap();
        assert_eq!(summary.result, "failure");
        assert_eq!(summary.details.unwrap()["status"], "partial");
    }

    #[tokio::test]
    async fn store_error_for_one_contractor_still_finishes_campaign() {
        let f = fixture(&[]);
        add_contractor(&f, "Acme");
        let bolt = add_contractor(&f, "Bolt");
        f.store.limit_portal_tokens(1);

        let result = f
            .automation
            .run(&CampaignRequest::new(f.job.id, CampaignType::Reminder7))
            .await
            .unwrap();

        assert_eq!((result.sent, result.failed), (1, 1));
        assert_eq!(result.status, "partial");
        assert_eq!(f.mailer.sent.lock().unwrap().len(), 1);

        let campaign = &f.store.campaigns()[0];
        assert_eq!(campaign.status, "partial");
        assert_eq!(campaign.sent_count, 1);
        assert!(campaign.sent_at.is_some());

        let audits = f.store.audits();
        let bolt_failure = audits
            .iter()
            .find(|a| a.contractor_id == Some(bolt.id))
            .unwrap();
        assert_eq!(bolt_failure.result, "failure");
        assert!(bolt_failure.error_message.is_some());
        assert!(audits
            .iter()
            .any(|a| a.notification_type == NOTIFICATION_SWMS_CAMPAIGN_SUMMARY));
    }

    #[tokio::test]
    async fn all_failures_mark_campaign_failed() {
        let f = fixture(&["acme@example.com"]);
        add_contractor(&f, "Acme");

        let result = f
            .automation
            .run(&CampaignRequest::new(f.job.id, CampaignType::Reminder7))
            .await
            .unwrap();
        assert_eq!(result.status, "failed");
        assert!(f.store.campaigns()[0].sent_at.is_none());
    }

    #[tokio::test]
    async fn initial_campaign_schedules_follow_ups() {
        let f = fixture(&[]);
        add_contractor(&f, "Acme");
        let now = Utc::now();

        let result = f
            .automation
            .run_at(&CampaignRequest::new(f.job.id, CampaignType::Initial), now)
            .await
            .unwrap();
        assert_eq!(result.follow_ups_scheduled, 3);

        let campaigns = f.store.campaigns();
        let reminder = campaigns
            .iter()
            .find(|c| c.campaign_type == "reminder_7")
            .unwrap();
        assert_eq!(reminder.status, "scheduled");
        assert_eq!(reminder.scheduled_at, Some(now + Duration::days(7)));
    }

    #[tokio::test]
    async fn test_mode_only_previews() {
        let f = fixture(&[]);
        add_contractor(&f, "Acme");

        let request = CampaignRequest {
            test_mode: true,
            ..CampaignRequest::new(f.job.id, CampaignType::Initial)
        };
        let result = f.automation.run(&request).await.unwrap();

        assert!(result.test_mode);
        assert_eq!(result.campaign_id, None);
        assert_eq!(result.previews.len(), 1);
        assert!(result.previews[0].body.contains("/portal/preview"));
        assert!(f.mailer.sent.lock().unwrap().is_empty());
        assert!(f.store.campaigns().is_empty());
        assert!(f.store.emails().is_empty());
        assert!(f.store.portal_tokens().is_empty());
        assert!(f.store.dedups().is_empty());

        let audits = f.store.audits();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].result, "skipped");
        assert_eq!(audits[0].notification_type, NOTIFICATION_SWMS_CAMPAIGN_SUMMARY);
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        let f = fixture(&[]);
        let bad_id = CampaignRequest::new(0, CampaignType::Initial);
        assert_matches!(
            f.automation.run(&bad_id).await,
            Err(NotifyError::Core(CoreError::Validation(_)))
        );

        let bad_type = CampaignRequest {
            campaign_type: "reminder_30".to_string(),
            ..CampaignRequest::new(f.job.id, CampaignType::Initial)
        };
        assert_matches!(
            f.automation.run(&bad_type).await,
            Err(NotifyError::Core(CoreError::Validation(_)))
        );

        let missing = CampaignRequest::new(9_999, CampaignType::Initial);
        assert_matches!(
            f.automation.run(&missing).await,
            Err(NotifyError::Core(CoreError::NotFound { entity: "swms_job", .. }))
        );
    }

    #[test]
    fn test_mode_defaults_to_false() {
        let request: CampaignRequest =
            serde_json::from_str(r#"{"swms_job_id": 3, "campaign_type": "initial"}"#).unwrap();
        assert!(!request.test_mode);
    }
}
