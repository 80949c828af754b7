//! In-process [`NotificationStore`] used by tests and local dry runs.
//!
//! Mirrors the query semantics of the Postgres repositories closely enough
//! for the notification services: latest-valid-certification selection,
//! pending-contractor filtering, unique `(job, campaign_type)` campaigns and
//! non-expired portal token lookups.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sitesafe_core::campaign::{status, CampaignType};
use sitesafe_core::notification::DeliveryStatus;
use sitesafe_core::submission::SubmissionStatus;
use sitesafe_core::tracking::TrackingKind;
use sitesafe_core::types::{Date, DbId, Timestamp};
use sitesafe_db::models::campaign::{
    CampaignEmail, CampaignTotals, CreateCampaignEmail, SentInitialCampaign, SwmsCampaign,
};
use sitesafe_db::models::contractor::Contractor;
use sitesafe_db::models::notification::{
    CreateAudit, CreateDedup, NotificationAudit, NotificationDedup,
};
use sitesafe_db::models::portal_token::{CreatePortalToken, PortalAccess, PortalTokenRow};
use sitesafe_db::models::submission::{CreateSubmission, SwmsSubmission};
use sitesafe_db::models::swms_job::SwmsJobDetail;
use sitesafe_db::models::tracking::TrackingEvent;
use sitesafe_db::models::worker::{ExpiringCertification, Worker, WorkerCertification};
use uuid::Uuid;

use super::{NotificationStore, StoreResult};

#[derive(Default)]
struct Inner {
    next_id: DbId,
    workers: Vec<Worker>,
    certifications: Vec<WorkerCertification>,
    jobs: Vec<SwmsJobDetail>,
    contractors: Vec<Contractor>,
    assignments: Vec<(DbId, DbId)>,
    campaigns: Vec<SwmsCampaign>,
    emails: Vec<CampaignEmail>,
    portal_tokens: Vec<PortalTokenRow>,
    submissions: Vec<SwmsSubmission>,
    dedups: Vec<NotificationDedup>,
    audits: Vec<NotificationAudit>,
    tracking_events: Vec<TrackingEvent>,
    portal_token_limit: Option<usize>,
}

impl Inner {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn latest_submission(&self, swms_job_id: DbId, contractor_id: DbId) -> Option<&SwmsSubmission> {
        self.submissions
            .iter()
            .filter(|s| s.swms_job_id == swms_job_id && s.contractor_id == contractor_id)
            .max_by_key(|s| (s.submitted_at, s.id))
    }

    fn campaign_mut(&mut self, campaign_id: DbId) -> StoreResult<&mut SwmsCampaign> {
        self.campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or(sqlx::Error::RowNotFound)
    }

    fn email_mut(&mut self, email_id: DbId) -> StoreResult<&mut CampaignEmail> {
        self.emails
            .iter_mut()
            .find(|e| e.id == email_id)
            .ok_or(sqlx::Error::RowNotFound)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_audits: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the state from the next assertion.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent audit insert fail.
    pub fn fail_audit_inserts(&self, fail: bool) {
        self.fail_audits.store(fail, Ordering::SeqCst);
    }

    /// Fail portal token inserts once `limit` tokens exist.
    pub fn limit_portal_tokens(&self, limit: usize) {
        self.lock().portal_token_limit = Some(limit);
    }

    // -- seeding ------------------------------------------------------------

    pub fn add_worker(&self, full_name: &str, email: &str) -> Worker {
        let mut inner = self.lock();
        let now = Utc::now();
        let worker = Worker {
            id: inner.next_id(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.workers.push(worker.clone());
        worker
    }

    pub fn deactivate_worker(&self, worker_id: DbId) {
        let mut inner = self.lock();
        if let Some(worker) = inner.workers.iter_mut().find(|w| w.id == worker_id) {
            worker.is_active = false;
        }
    }

    pub fn add_certification(
        &self,
        worker_id: DbId,
        certification_type: &str,
        cert_status: &str,
        expiry_date: Date,
    ) -> WorkerCertification {
        let mut inner = self.lock();
        let cert = WorkerCertification {
            id: inner.next_id(),
            worker_id,
            certification_type: certification_type.to_string(),
            status: cert_status.to_string(),
            expiry_date,
            created_at: Utc::now(),
        };
        inner.certifications.push(cert.clone());
        cert
    }

    pub fn add_job(
        &self,
        title: &str,
        due_date: Date,
        site_name: &str,
        site_address: &str,
    ) -> SwmsJobDetail {
        let mut inner = self.lock();
        let job_site_id = inner.next_id();
        let job = SwmsJobDetail {
            id: inner.next_id(),
            title: title.to_string(),
            due_date,
            job_site_id,
            site_name: site_name.to_string(),
            site_address: site_address.to_string(),
        };
        inner.jobs.push(job.clone());
        job
    }

    pub fn add_contractor(&self, company_name: &str, contact_name: &str, email: &str) -> Contractor {
        let mut inner = self.lock();
        let now = Utc::now();
        let contractor = Contractor {
            id: inner.next_id(),
            company_name: company_name.to_string(),
            contact_name: contact_name.to_string(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.contractors.push(contractor.clone());
        contractor
    }

    pub fn assign(&self, swms_job_id: DbId, contractor_id: DbId) {
        let mut inner = self.lock();
        if !inner.assignments.contains(&(swms_job_id, contractor_id)) {
            inner.assignments.push((swms_job_id, contractor_id));
        }
    }

    pub fn add_submission(
        &self,
        swms_job_id: DbId,
        contractor_id: DbId,
        submission_status: SubmissionStatus,
    ) -> SwmsSubmission {
        let mut inner = self.lock();
        let now = Utc::now();
        let submission = SwmsSubmission {
            id: inner.next_id(),
            swms_job_id,
            contractor_id,
            status: submission_status.as_str().to_string(),
            file_ref: format!("uploads/{swms_job_id}/{contractor_id}.pdf"),
            file_name: "swms.pdf".to_string(),
            notes: None,
            reviewer_notes: None,
            reviewed_at: None,
            submitted_at: now,
            created_at: now,
            updated_at: now,
        };
        inner.submissions.push(submission.clone());
        submission
    }

    /// Insert a dedup row with an explicit creation time.
    pub fn add_dedup_at(&self, dedup: &CreateDedup, created_at: Timestamp) {
        let mut inner = self.lock();
        let row = NotificationDedup {
            id: inner.next_id(),
            dedup_key: dedup.dedup_key.clone(),
            notification_type: dedup.notification_type.clone(),
            worker_id: dedup.worker_id,
            contractor_id: dedup.contractor_id,
            campaign_id: dedup.campaign_id,
            expiry_date: dedup.expiry_date,
            created_at,
        };
        inner.dedups.push(row);
    }

    /// Insert a campaign row directly, bypassing the automation.
    pub fn add_campaign(
        &self,
        swms_job_id: DbId,
        campaign_type: CampaignType,
        campaign_status: &str,
        scheduled_at: Option<Timestamp>,
        sent_at: Option<Timestamp>,
    ) -> SwmsCampaign {
        let mut inner = self.lock();
        let now = Utc::now();
        let campaign = SwmsCampaign {
            id: inner.next_id(),
            swms_job_id,
            campaign_type: campaign_type.as_str().to_string(),
            status: campaign_status.to_string(),
            scheduled_at,
            sent_at,
            total_count: 0,
            sent_count: 0,
            failed_count: 0,
            skipped_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.campaigns.push(campaign.clone());
        campaign
    }

    // -- inspection ---------------------------------------------------------

    pub fn audits(&self) -> Vec<NotificationAudit> {
        self.lock().audits.clone()
    }

    pub fn dedups(&self) -> Vec<NotificationDedup> {
        self.lock().dedups.clone()
    }

    pub fn campaigns(&self) -> Vec<SwmsCampaign> {
        self.lock().campaigns.clone()
    }

    pub fn emails(&self) -> Vec<CampaignEmail> {
        self.lock().emails.clone()
    }

    pub fn portal_tokens(&self) -> Vec<PortalTokenRow> {
        self.lock().portal_tokens.clone()
    }

    pub fn submissions(&self) -> Vec<SwmsSubmission> {
        self.lock().submissions.clone()
    }

    pub fn tracking_events(&self) -> Vec<TrackingEvent> {
        self.lock().tracking_events.clone()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn expiring_certifications(
        &self,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<ExpiringCertification>> {
        let inner = self.lock();
        let mut rows: Vec<ExpiringCertification> = inner
            .workers
            .iter()
            .filter(|w| w.is_active)
            .filter_map(|w| {
                let latest = inner
                    .certifications
                    .iter()
                    .filter(|c| c.worker_id == w.id && c.status == "valid")
                    .max_by_key(|c| (c.expiry_date, c.id))?;
                Some(ExpiringCertification {
                    worker_id: w.id,
                    worker_name: w.full_name.clone(),
                    worker_email: w.email.clone(),
                    certification_id: latest.id,
                    certification_type: latest.certification_type.clone(),
                    expiry_date: latest.expiry_date,
                })
            })
            .filter(|row| row.expiry_date >= start && row.expiry_date <= end)
            .collect();
        rows.sort_by_key(|row| (row.expiry_date, row.worker_id));
        Ok(rows)
    }

    async fn dedup_exists_since(
        &self,
        dedup_key: &str,
        notification_type: &str,
        since: Timestamp,
    ) -> StoreResult<bool> {
        Ok(self.lock().dedups.iter().any(|d| {
            d.dedup_key == dedup_key
                && d.notification_type == notification_type
                && d.created_at >= since
        }))
    }

    async fn insert_dedup(&self, dedup: &CreateDedup) -> StoreResult<()> {
        self.add_dedup_at(dedup, Utc::now());
        Ok(())
    }

    async fn insert_audit(&self, audit: &CreateAudit) -> StoreResult<DbId> {
        if self.fail_audits.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.audits.push(NotificationAudit {
            id,
            notification_type: audit.notification_type.clone(),
            result: audit.result.as_str().to_string(),
            recipient: audit.recipient.clone(),
            worker_id: audit.worker_id,
            contractor_id: audit.contractor_id,
            swms_job_id: audit.swms_job_id,
            campaign_id: audit.campaign_id,
            error_message: audit.error_message.clone(),
            details: audit.details.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_job(&self, swms_job_id: DbId) -> StoreResult<Option<SwmsJobDetail>> {
        Ok(self.lock().jobs.iter().find(|j| j.id == swms_job_id).cloned())
    }

    async fn pending_contractors(&self, swms_job_id: DbId) -> StoreResult<Vec<Contractor>> {
        let inner = self.lock();
        let mut contractors: Vec<Contractor> = inner
            .contractors
            .iter()
            .filter(|c| inner.assignments.contains(&(swms_job_id, c.id)))
            .filter(|c| {
                !inner.submissions.iter().any(|s| {
                    s.swms_job_id == swms_job_id
                        && s.contractor_id == c.id
                        && s.status == SubmissionStatus::Approved.as_str()
                })
            })
            .cloned()
            .collect();
        contractors.sort_by_key(|c| c.id);
        Ok(contractors)
    }

    async fn latest_submission_statuses(
        &self,
        swms_job_id: DbId,
    ) -> StoreResult<Vec<(DbId, Option<String>)>> {
        let inner = self.lock();
        let mut rows: Vec<(DbId, Option<String>)> = inner
            .assignments
            .iter()
            .filter(|(job_id, _)| *job_id == swms_job_id)
            .map(|(_, contractor_id)| {
                let status = inner
                    .latest_submission(swms_job_id, *contractor_id)
                    .map(|s| s.status.clone());
                (*contractor_id, status)
            })
            .collect();
        rows.sort_by_key(|(contractor_id, _)| *contractor_id);
        Ok(rows)
    }

    async fn find_or_create_campaign(
        &self,
        swms_job_id: DbId,
        campaign_type: CampaignType,
    ) -> StoreResult<SwmsCampaign> {
        let existing = self
            .lock()
            .campaigns
            .iter()
            .find(|c| c.swms_job_id == swms_job_id && c.campaign_type == campaign_type.as_str())
            .cloned();
        match existing {
            Some(campaign) => Ok(campaign),
            None => Ok(self.add_campaign(swms_job_id, campaign_type, status::SCHEDULED, None, None)),
        }
    }

    async fn set_campaign_status(&self, campaign_id: DbId, new_status: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        let campaign = inner.campaign_mut(campaign_id)?;
        campaign.status = new_status.to_string();
        campaign.updated_at = Utc::now();
        Ok(())
    }

    async fn finish_campaign(
        &self,
        campaign_id: DbId,
        new_status: &str,
        totals: &CampaignTotals,
    ) -> StoreResult<SwmsCampaign> {
        let mut inner = self.lock();
        let campaign = inner.campaign_mut(campaign_id)?;
        let now = Utc::now();
        campaign.status = new_status.to_string();
        campaign.total_count = totals.total;
        campaign.sent_count = totals.sent;
        campaign.failed_count = totals.failed;
        campaign.skipped_count = totals.skipped;
        if totals.sent > 0 {
            campaign.sent_at = Some(now);
        }
        campaign.updated_at = now;
        Ok(campaign.clone())
    }

    async fn due_campaigns(&self, now: Timestamp) -> StoreResult<Vec<SwmsCampaign>> {
        let inner = self.lock();
        let mut due: Vec<SwmsCampaign> = inner
            .campaigns
            .iter()
            .filter(|c| c.status == status::SCHEDULED)
            .filter(|c| c.scheduled_at.is_some_and(|at| at <= now))
            .cloned()
            .collect();
        due.sort_by_key(|c| (c.scheduled_at, c.id));
        Ok(due)
    }

    async fn sent_initial_campaigns(&self) -> StoreResult<Vec<SentInitialCampaign>> {
        let inner = self.lock();
        let initial = CampaignType::Initial.as_str();
        let rows = inner
            .campaigns
            .iter()
            .filter(|c| c.campaign_type == initial)
            .filter_map(|c| {
                let sent_at = c.sent_at?;
                let job = inner.jobs.iter().find(|j| j.id == c.swms_job_id)?;
                let existing_types = inner
                    .campaigns
                    .iter()
                    .filter(|f| f.swms_job_id == c.swms_job_id && f.campaign_type != initial)
                    .map(|f| f.campaign_type.clone())
                    .collect();
                Some(SentInitialCampaign {
                    swms_job_id: c.swms_job_id,
                    sent_at,
                    due_date: job.due_date,
                    existing_types,
                })
            })
            .collect();
        Ok(rows)
    }

    async fn schedule_campaign(
        &self,
        swms_job_id: DbId,
        campaign_type: CampaignType,
        scheduled_at: Timestamp,
    ) -> StoreResult<bool> {
        let exists = self
            .lock()
            .campaigns
            .iter()
            .any(|c| c.swms_job_id == swms_job_id && c.campaign_type == campaign_type.as_str());
        if exists {
            return Ok(false);
        }
        self.add_campaign(
            swms_job_id,
            campaign_type,
            status::SCHEDULED,
            Some(scheduled_at),
            None,
        );
        Ok(true)
    }

    async fn create_campaign_email(&self, email: &CreateCampaignEmail) -> StoreResult<DbId> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let now = Utc::now();
        inner.emails.push(CampaignEmail {
            id,
            campaign_id: email.campaign_id,
            contractor_id: email.contractor_id,
            recipient_email: email.recipient_email.clone(),
            subject: email.subject.clone(),
            status: DeliveryStatus::Pending.as_str().to_string(),
            error_message: None,
            tracking_token: email.tracking_token,
            portal_token_id: email.portal_token_id,
            sent_at: None,
            open_count: 0,
            click_count: 0,
            first_opened_at: None,
            first_clicked_at: None,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn mark_email_sent(&self, email_id: DbId, sent_at: Timestamp) -> StoreResult<()> {
        let mut inner = self.lock();
        let email = inner.email_mut(email_id)?;
        email.status = DeliveryStatus::Sent.as_str().to_string();
        email.sent_at = Some(sent_at);
        email.error_message = None;
        Ok(())
    }

    async fn mark_email_failed(&self, email_id: DbId, error: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        let email = inner.email_mut(email_id)?;
        email.status = DeliveryStatus::Failed.as_str().to_string();
        email.error_message = Some(error.to_string());
        Ok(())
    }

    async fn record_engagement(
        &self,
        tracking_token: Uuid,
        kind: TrackingKind,
        occurred_at: Timestamp,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        let Some(email) = inner
            .emails
            .iter_mut()
            .find(|e| e.tracking_token == tracking_token)
        else {
            return Ok(false);
        };
        match kind {
            TrackingKind::Open => {
                email.open_count += 1;
                email.first_opened_at.get_or_insert(occurred_at);
            }
            TrackingKind::Click => {
                email.click_count += 1;
                email.first_clicked_at.get_or_insert(occurred_at);
            }
        }
        Ok(true)
    }

    async fn insert_tracking_event(
        &self,
        tracking_token: Uuid,
        kind: TrackingKind,
        email: Option<&str>,
        occurred_at: Timestamp,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.tracking_events.push(TrackingEvent {
            id,
            tracking_token,
            event_type: kind.as_str().to_string(),
            email: email.map(str::to_string),
            occurred_at,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn create_portal_token(&self, token: &CreatePortalToken) -> StoreResult<DbId> {
        let mut inner = self.lock();
        if inner
            .portal_token_limit
            .is_some_and(|limit| inner.portal_tokens.len() >= limit)
        {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let id = inner.next_id();
        inner.portal_tokens.push(PortalTokenRow {
            id,
            token: token.token.clone(),
            contractor_id: token.contractor_id,
            swms_job_id: token.swms_job_id,
            expires_at: token.expires_at,
            last_used_at: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_portal_access(
        &self,
        token: &str,
        now: Timestamp,
    ) -> StoreResult<Option<PortalAccess>> {
        let inner = self.lock();
        let Some(row) = inner
            .portal_tokens
            .iter()
            .find(|t| t.token == token && t.expires_at > now)
        else {
            return Ok(None);
        };
        let contractor = inner.contractors.iter().find(|c| c.id == row.contractor_id);
        let job = inner.jobs.iter().find(|j| j.id == row.swms_job_id);
        Ok(contractor.zip(job).map(|(contractor, job)| PortalAccess {
            token_id: row.id,
            contractor_id: contractor.id,
            company_name: contractor.company_name.clone(),
            contact_name: contractor.contact_name.clone(),
            contractor_email: contractor.email.clone(),
            swms_job_id: job.id,
            job_title: job.title.clone(),
            due_date: job.due_date,
            site_name: job.site_name.clone(),
            site_address: job.site_address.clone(),
            expires_at: row.expires_at,
        }))
    }

    async fn touch_portal_token(&self, token_id: DbId, used_at: Timestamp) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(row) = inner.portal_tokens.iter_mut().find(|t| t.id == token_id) {
            row.last_used_at = Some(used_at);
        }
        Ok(())
    }

    async fn has_approved_submission(
        &self,
        swms_job_id: DbId,
        contractor_id: DbId,
    ) -> StoreResult<bool> {
        Ok(self.lock().submissions.iter().any(|s| {
            s.swms_job_id == swms_job_id
                && s.contractor_id == contractor_id
                && s.status == SubmissionStatus::Approved.as_str()
        }))
    }

    async fn create_submission(
        &self,
        submission: &CreateSubmission,
    ) -> StoreResult<SwmsSubmission> {
        let mut inner = self.lock();
        let now = Utc::now();
        let row = SwmsSubmission {
            id: inner.next_id(),
            swms_job_id: submission.swms_job_id,
            contractor_id: submission.contractor_id,
            status: SubmissionStatus::Submitted.as_str().to_string(),
            file_ref: submission.file_ref.clone(),
            file_name: submission.file_name.clone(),
            notes: submission.notes.clone(),
            reviewer_notes: None,
            reviewed_at: None,
            submitted_at: now,
            created_at: now,
            updated_at: now,
        };
        inner.submissions.push(row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn renewed_certification_hides_older_one() {
        let store = MemoryStore::new();
        let worker = store.add_worker("Ana", "ana@example.com");
        store.add_certification(worker.id, "White Card", "valid", date(2024, 5, 10));
        store.add_certification(worker.id, "White Card", "valid", date(2026, 5, 10));

        let rows = store
            .expiring_certifications(date(2024, 5, 1), date(2024, 5, 31))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn campaigns_are_unique_per_job_and_type() {
        let store = MemoryStore::new();
        let job = store.add_job("Formwork", date(2024, 6, 1), "Tower", "1 Quay St");
        let first = store
            .find_or_create_campaign(job.id, CampaignType::Initial)
            .await
            .unwrap();
        let second = store
            .find_or_create_campaign(job.id, CampaignType::Initial)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert!(!store
            .schedule_campaign(job.id, CampaignType::Initial, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_tokens_do_not_resolve() {
        let store = MemoryStore::new();
        let job = store.add_job("Formwork", date(2024, 6, 1), "Tower", "1 Quay St");
        let contractor = store.add_contractor("Acme", "Sam", "sam@acme.example");
        let now = Utc::now();
        store
            .create_portal_token(&CreatePortalToken {
                token: "t".repeat(64),
                contractor_id: contractor.id,
                swms_job_id: job.id,
                expires_at: now,
            })
            .await
            .unwrap();
        assert!(store
            .find_portal_access(&"t".repeat(64), now)
            .await
            .unwrap()
            .is_none());
    }
}
