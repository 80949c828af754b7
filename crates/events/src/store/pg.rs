//! [`NotificationStore`] backed by PostgreSQL repositories.

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
use sitesafe_db::repositories::{
    CampaignEmailRepo, CampaignRepo, ContractorRepo, NotificationAuditRepo,
    NotificationDedupRepo, PortalTokenRepo, SubmissionRepo, SwmsJobRepo, TrackingEventRepo,
    WorkerRepo,
};
use sitesafe_db::DbPool;
use uuid::Uuid;

use super::{NotificationStore, StoreResult};

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: DbPool,
}

impl PgNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn expiring_certifications(
        &self,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<ExpiringCertification>> {
        WorkerRepo::list_expiring(&self.pool, start, end).await
    }

    async fn dedup_exists_since(
        &self,
        dedup_key: &str,
        notification_type: &str,
        since: Timestamp,
    ) -> StoreResult<bool> {
        NotificationDedupRepo::exists_since(&self.pool, dedup_key, notification_type, since).await
    }

    async fn insert_dedup(&self, dedup: &CreateDedup) -> StoreResult<()> {
        NotificationDedupRepo::create(&self.pool, dedup).await
    }

    async fn insert_audit(&self, audit: &CreateAudit) -> StoreResult<DbId> {
        NotificationAuditRepo::create(&self.pool, audit).await
    }

    async fn find_job(&self, swms_job_id: DbId) -> StoreResult<Option<SwmsJobDetail>> {
        SwmsJobRepo::find_detail(&self.pool, swms_job_id).await
    }

    async fn pending_contractors(&self, swms_job_id: DbId) -> StoreResult<Vec<Contractor>> {
        ContractorRepo::list_pending_for_job(&self.pool, swms_job_id).await
    }

    async fn latest_submission_statuses(
        &self,
        swms_job_id: DbId,
    ) -> StoreResult<Vec<(DbId, Option<String>)>> {
        SubmissionRepo::latest_statuses_for_job(&self.pool, swms_job_id).await
    }

    async fn find_or_create_campaign(
        &self,
        swms_job_id: DbId,
        campaign_type: CampaignType,
    ) -> StoreResult<SwmsCampaign> {
        CampaignRepo::find_or_create(&self.pool, swms_job_id, campaign_type).await
    }

    async fn set_campaign_status(&self, campaign_id: DbId, status: &str) -> StoreResult<()> {
        CampaignRepo::set_status(&self.pool, campaign_id, status).await?;
        Ok(())
    }

    async fn finish_campaign(
        &self,
        campaign_id: DbId,
        status: &str,
        totals: &CampaignTotals,
    ) -> StoreResult<SwmsCampaign> {
        CampaignRepo::finish(&self.pool, campaign_id, status, totals).await
    }

    async fn due_campaigns(&self, now: Timestamp) -> StoreResult<Vec<SwmsCampaign>> {
        CampaignRepo::list_due(&self.pool, now).await
    }

    async fn sent_initial_campaigns(&self) -> StoreResult<Vec<SentInitialCampaign>> {
        CampaignRepo::list_sent_initials(&self.pool).await
    }

    async fn schedule_campaign(
        &self,
        swms_job_id: DbId,
        campaign_type: CampaignType,
        scheduled_at: Timestamp,
    ) -> StoreResult<bool> {
        CampaignRepo::insert_scheduled(&self.pool, swms_job_id, campaign_type, scheduled_at).await
    }

    async fn create_campaign_email(&self, email: &CreateCampaignEmail) -> StoreResult<DbId> {
        CampaignEmailRepo::create(&self.pool, email).await
    }

    async fn mark_email_sent(&self, email_id: DbId, sent_at: Timestamp) -> StoreResult<()> {
        CampaignEmailRepo::mark_sent(&self.pool, email_id, sent_at).await
    }

    async fn mark_email_failed(&self, email_id: DbId, error: &str) -> StoreResult<()> {
        CampaignEmailRepo::mark_failed(&self.pool, email_id, error).await
    }

    async fn record_engagement(
        &self,
        tracking_token: Uuid,
        kind: TrackingKind,
        occurred_at: Timestamp,
    ) -> StoreResult<bool> {
        CampaignEmailRepo::record_engagement(&self.pool, tracking_token, kind, occurred_at).await
    }

    async fn insert_tracking_event(
        &self,
        tracking_token: Uuid,
        kind: TrackingKind,
        email: Option<&str>,
        occurred_at: Timestamp,
    ) -> StoreResult<()> {
        TrackingEventRepo::create(&self.pool, tracking_token, kind, email, occurred_at).await?;
        Ok(())
    }

    async fn create_portal_token(&self, token: &CreatePortalToken) -> StoreResult<DbId> {
        PortalTokenRepo::create(&self.pool, token).await
    }

    async fn find_portal_access(
        &self,
        token: &str,
        now: Timestamp,
    ) -> StoreResult<Option<PortalAccess>> {
        PortalTokenRepo::find_access(&self.pool, token, now).await
    }

    async fn touch_portal_token(&self, token_id: DbId, used_at: Timestamp) -> StoreResult<()> {
        PortalTokenRepo::touch(&self.pool, token_id, used_at).await
    }

    async fn has_approved_submission(
        &self,
        swms_job_id: DbId,
        contractor_id: DbId,
    ) -> StoreResult<bool> {
        SubmissionRepo::has_approved(&self.pool, swms_job_id, contractor_id).await
    }

    async fn create_submission(
        &self,
        submission: &CreateSubmission,
    ) -> StoreResult<SwmsSubmission> {
        SubmissionRepo::create(&self.pool, submission).await
    }
}
