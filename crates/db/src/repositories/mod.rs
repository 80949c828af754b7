//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod campaign_email_repo;
pub mod campaign_repo;
pub mod contractor_repo;
pub mod job_site_repo;
pub mod notification_audit_repo;
pub mod notification_dedup_repo;
pub mod portal_token_repo;
pub mod submission_repo;
pub mod swms_job_repo;
pub mod tracking_event_repo;
pub mod worker_repo;

pub use campaign_email_repo::CampaignEmailRepo;
pub use campaign_repo::CampaignRepo;
pub use contractor_repo::ContractorRepo;
pub use job_site_repo::JobSiteRepo;
pub use notification_audit_repo::NotificationAuditRepo;
pub use notification_dedup_repo::NotificationDedupRepo;
pub use portal_token_repo::PortalTokenRepo;
pub use submission_repo::SubmissionRepo;
pub use swms_job_repo::SwmsJobRepo;
pub use tracking_event_repo::TrackingEventRepo;
pub use worker_repo::WorkerRepo;
