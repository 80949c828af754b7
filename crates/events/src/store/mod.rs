//! Persistence seam for the notification services.
//!
//! [`NotificationStore`] covers every read and write the expiry job, campaign
//! automation, reminder scheduler and the tracking/portal endpoints perform.
//! [`PgNotificationStore`] delegates to the `sitesafe-db` repositories;
//! [`MemoryStore`] keeps everything in process for tests and dry runs.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use sitesafe_core::campaign::CampaignType;
use sitesafe_core::tracking::TrackingKind;
use sitesafe_core::types::{Date, DbId, Timestamp};
use sitesafe_db::models::campaign::{
    CampaignTotals, CreateCampaignEmail, SentInitialCampaign, SwmsCampaign,
};
use sitesafe_db::models::contractor::Contractor;
use sitesafe_db::models::notification::{CreateAudit, CreateDedup};
use sitesafe_db::models::portal_token::{CreatePortalToken, PortalAccess};
use sitesafe_db::models::submission::{CreateSubmission, SwmsSubmission};
use sitesafe_db::models::swms_job::SwmsJobDetail;
use sitesafe_db::models::worker::ExpiringCertification;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use pg::PgNotificationStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    // -- certifications -----------------------------------------------------

    /// Active workers whose latest valid certification expires in `[start, end]`.
    async fn expiring_certifications(
        &self,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<ExpiringCertification>>;

    // -- dedup and audit ----------------------------------------------------

    async fn dedup_exists_since(
        &self,
        dedup_key: &str,
        notification_type: &str,
        since: Timestamp,
    ) -> StoreResult<bool>;

    async fn insert_dedup(&self, dedup: &CreateDedup) -> StoreResult<()>;

    async fn insert_audit(&self, audit: &CreateAudit) -> StoreResult<DbId>;

    // -- jobs and contractors -----------------------------------------------

    async fn find_job(&self, swms_job_id: DbId) -> StoreResult<Option<SwmsJobDetail>>;

    /// Assigned contractors without an approved submission.
    async fn pending_contractors(&self, swms_job_id: DbId) -> StoreResult<Vec<Contractor>>;

    /// `(contractor_id, latest submission status)` for every assigned contractor.
    async fn latest_submission_statuses(
        &self,
        swms_job_id: DbId,
    ) -> StoreResult<Vec<(DbId, Option<String>)>>;

    // -- campaigns ----------------------------------------------------------

    async fn find_or_create_campaign(
        &self,
        swms_job_id: DbId,
        campaign_type: CampaignType,
    ) -> StoreResult<SwmsCampaign>;

    async fn set_campaign_status(&self, campaign_id: DbId, status: &str) -> StoreResult<()>;

    async fn finish_campaign(
        &self,
        campaign_id: DbId,
        status: &str,
        totals: &CampaignTotals,
    ) -> StoreResult<SwmsCampaign>;

    async fn due_campaigns(&self, now: Timestamp) -> StoreResult<Vec<SwmsCampaign>>;

    async fn sent_initial_campaigns(&self) -> StoreResult<Vec<SentInitialCampaign>>;

    /// Insert a scheduled follow-up; `false` when the job already has one of that type.
    async fn schedule_campaign(
        &self,
        swms_job_id: DbId,
        campaign_type: CampaignType,
        scheduled_at: Timestamp,
    ) -> StoreResult<bool>;

    // -- campaign emails ----------------------------------------------------

    async fn create_campaign_email(&self, email: &CreateCampaignEmail) -> StoreResult<DbId>;

    async fn mark_email_sent(&self, email_id: DbId, sent_at: Timestamp) -> StoreResult<()>;

    async fn mark_email_failed(&self, email_id: DbId, error: &str) -> StoreResult<()>;

    // -- tracking -----------------------------------------------------------

    /// Bump engagement counters; `false` for an unknown tracking token.
    async fn record_engagement(
        &self,
        tracking_token: Uuid,
        kind: TrackingKind,
        occurred_at: Timestamp,
    ) -> StoreResult<bool>;

    async fn insert_tracking_event(
        &self,
        tracking_token: Uuid,
        kind: TrackingKind,
        email: Option<&str>,
        occurred_at: Timestamp,
    ) -> StoreResult<()>;

    // -- portal -------------------------------------------------------------

    async fn create_portal_token(&self, token: &CreatePortalToken) -> StoreResult<DbId>;

    /// Resolve a token that is still valid at `now`.
    async fn find_portal_access(
        &self,
        token: &str,
        now: Timestamp,
    ) -> StoreResult<Option<PortalAccess>>;

    async fn touch_portal_token(&self, token_id: DbId, used_at: Timestamp) -> StoreResult<()>;

    async fn has_approved_submission(
        &self,
        swms_job_id: DbId,
        contractor_id: DbId,
    ) -> StoreResult<bool>;

    async fn create_submission(&self, submission: &CreateSubmission)
        -> StoreResult<SwmsSubmission>;
}

/// Write an audit row, logging instead of failing when the insert errors.
pub async fn record_audit(store: &dyn NotificationStore, audit: CreateAudit) {
    if let Err(e) = store.insert_audit(&audit).await {
        tracing::warn!(
            notification_type = %audit.notification_type,
            result = %audit.result,
            error = %e,
            "Failed to write notification audit row"
        );
    }
}
