//! Repository integration tests against a migrated database.

use chrono::{Duration, NaiveDate, Utc};
use sitesafe_core::campaign::{status, CampaignType};
use sitesafe_core::notification::{AuditResult, NOTIFICATION_CERT_EXPIRY, NOTIFICATION_SWMS_CAMPAIGN};
use sitesafe_core::submission::SubmissionStatus;
use sitesafe_core::tracking::TrackingKind;
use sitesafe_db::models::campaign::{CampaignTotals, CreateCampaignEmail};
use sitesafe_db::models::contractor::{Contractor, CreateContractor};
use sitesafe_db::models::notification::{AuditQuery, CreateAudit, CreateDedup};
use sitesafe_db::models::portal_token::CreatePortalToken;
use sitesafe_db::models::submission::CreateSubmission;
use sitesafe_db::models::swms_job::{CreateJobSite, CreateSwmsJob, SwmsJob};
use sitesafe_db::models::worker::{CreateCertification, CreateWorker};
use sitesafe_db::repositories::{
    CampaignEmailRepo, CampaignRepo, ContractorRepo, JobSiteRepo, NotificationAuditRepo,
    NotificationDedupRepo, PortalTokenRepo, SubmissionRepo, SwmsJobRepo, TrackingEventRepo,
    WorkerRepo,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_job(pool: &PgPool, due_date: NaiveDate) -> SwmsJob {
    let site = JobSiteRepo::create(
        pool,
        &CreateJobSite {
            name: "Harbour Tower".to_string(),
            address: "1 Quay St".to_string(),
        },
    )
    .await
    .unwrap();
    SwmsJobRepo::create(
        pool,
        &CreateSwmsJob {
            job_site_id: site.id,
            title: "Level 4 formwork".to_string(),
            due_date,
        },
    )
    .await
    .unwrap()
}

async fn seed_contractor(pool: &PgPool, job_id: i64, company: &str) -> Contractor {
    let contractor = ContractorRepo::create(
        pool,
        &CreateContractor {
            company_name: company.to_string(),
            contact_name: format!("{company} Contact"),
            email: format!("{}@example.com", company.to_lowercase()),
        },
    )
    .await
    .unwrap();
    ContractorRepo::assign_to_job(pool, job_id, contractor.id)
        .await
        .unwrap();
    contractor
}

async fn submit(pool: &PgPool, job_id: i64, contractor_id: i64) -> i64 {
    SubmissionRepo::create(
        pool,
        &CreateSubmission {
            swms_job_id: job_id,
            contractor_id,
            file_ref: "uploads/swms.pdf".to_string(),
            file_name: "swms.pdf".to_string(),
            notes: None,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn expiring_uses_latest_valid_certification(pool: PgPool) {
    sitesafe_db::health_check(&pool).await.unwrap();

    let renewed = WorkerRepo::create(
        &pool,
        &CreateWorker {
            full_name: "Renewed Worker".to_string(),
            email: "renewed@example.com".to_string(),
        },
    )
    .await
    .unwrap();
    let expiring = WorkerRepo::create(
        &pool,
        &CreateWorker {
            full_name: "Expiring Worker".to_string(),
            email: "expiring@example.com".to_string(),
        },
    )
    .await
    .unwrap();

    for (worker_id, expiry, status) in [
        (renewed.id, date(2024, 5, 10), None),
        (renewed.id, date(2025, 5, 10), None),
        (expiring.id, date(2024, 5, 20), None),
        (expiring.id, date(2024, 5, 25), Some("revoked".to_string())),
    ] {
        WorkerRepo::add_certification(
            &pool,
            &CreateCertification {
                worker_id,
                certification_type: "White Card".to_string(),
                status,
                expiry_date: expiry,
            },
        )
        .await
        .unwrap();
    }

    let rows = WorkerRepo::list_expiring(&pool, date(2024, 5, 1), date(2024, 5, 31))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].worker_id, expiring.id);
    assert_eq!(rows[0].expiry_date, date(2024, 5, 20));
}

#[sqlx::test(migrations = "./migrations")]
async fn inactive_workers_are_not_expiring(pool: PgPool) {
    let worker = WorkerRepo::create(
        &pool,
        &CreateWorker {
            full_name: "Gone".to_string(),
            email: "gone@example.com".to_string(),
        },
    )
    .await
    .unwrap();
    WorkerRepo::add_certification(
        &pool,
        &CreateCertification {
            worker_id: worker.id,
            certification_type: "EWP".to_string(),
            status: None,
            expiry_date: date(2024, 5, 2),
        },
    )
    .await
    .unwrap();
    assert!(WorkerRepo::set_active(&pool, worker.id, false).await.unwrap());

    let rows = WorkerRepo::list_expiring(&pool, date(2024, 5, 1), date(2024, 5, 31))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// Contractors and submissions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn pending_contractors_exclude_approved(pool: PgPool) {
    let job = seed_job(&pool, date(2024, 6, 30)).await;
    let approved = seed_contractor(&pool, job.id, "Acme").await;
    let pending = seed_contractor(&pool, job.id, "Bolt").await;

    let submission_id = submit(&pool, job.id, approved.id).await;
    SubmissionRepo::update_status(
        &pool,
        submission_id,
        SubmissionStatus::Submitted,
        SubmissionStatus::UnderReview,
        None,
    )
    .await
    .unwrap()
    .unwrap();
    SubmissionRepo::update_status(
        &pool,
        submission_id,
        SubmissionStatus::UnderReview,
        SubmissionStatus::Approved,
        Some("Looks good"),
    )
    .await
    .unwrap()
    .unwrap();

    let contractors = ContractorRepo::list_pending_for_job(&pool, job.id).await.unwrap();
    assert_eq!(contractors.len(), 1);
    assert_eq!(contractors[0].id, pending.id);
    assert!(SubmissionRepo::has_approved(&pool, job.id, approved.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn status_update_is_guarded_by_expected_status(pool: PgPool) {
    let job = seed_job(&pool, date(2024, 6, 30)).await;
    let contractor = seed_contractor(&pool, job.id, "Acme").await;
    let submission_id = submit(&pool, job.id, contractor.id).await;

    let stale = SubmissionRepo::update_status(
        &pool,
        submission_id,
        SubmissionStatus::UnderReview,
        SubmissionStatus::Approved,
        None,
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    let reviewed = SubmissionRepo::update_status(
        &pool,
        submission_id,
        SubmissionStatus::Submitted,
        SubmissionStatus::UnderReview,
        Some("Checking"),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(reviewed.status, "under_review");
    assert_eq!(reviewed.reviewer_notes.as_deref(), Some("Checking"));
    assert!(reviewed.reviewed_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn latest_statuses_include_unsubmitted(pool: PgPool) {
    let job = seed_job(&pool, date(2024, 6, 30)).await;
    let submitted = seed_contractor(&pool, job.id, "Acme").await;
    let silent = seed_contractor(&pool, job.id, "Bolt").await;
    submit(&pool, job.id, submitted.id).await;

    let statuses = SubmissionRepo::latest_statuses_for_job(&pool, job.id)
        .await
        .unwrap();
    assert_eq!(
        statuses,
        vec![
            (submitted.id, Some("submitted".to_string())),
            (silent.id, None),
        ]
    );
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn find_or_create_returns_existing_campaign(pool: PgPool) {
    let job = seed_job(&pool, date(2024, 6, 30)).await;
    let first = CampaignRepo::find_or_create(&pool, job.id, CampaignType::Initial)
        .await
        .unwrap();
    let second = CampaignRepo::find_or_create(&pool, job.id, CampaignType::Initial)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.status, status::SCHEDULED);
    assert!(first.scheduled_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn follow_ups_are_inserted_once_and_become_due(pool: PgPool) {
    let job = seed_job(&pool, date(2024, 6, 30)).await;
    let initial = CampaignRepo::find_or_create(&pool, job.id, CampaignType::Initial)
        .await
        .unwrap();
    let finished = CampaignRepo::finish(
        &pool,
        initial.id,
        status::SENT,
        &CampaignTotals {
            total: 2,
            sent: 2,
            failed: 0,
            skipped: 0,
        },
    )
    .await
    .unwrap();
    assert!(finished.sent_at.is_some());
    assert_eq!(finished.sent_count, 2);

    let initials = CampaignRepo::list_sent_initials(&pool).await.unwrap();
    assert_eq!(initials.len(), 1);
    assert!(initials[0].existing_types.is_empty());

    let at = Utc::now() - Duration::hours(1);
    assert!(CampaignRepo::insert_scheduled(&pool, job.id, CampaignType::Reminder7, at)
        .await
        .unwrap());
    assert!(!CampaignRepo::insert_scheduled(&pool, job.id, CampaignType::Reminder7, at)
        .await
        .unwrap());

    let initials = CampaignRepo::list_sent_initials(&pool).await.unwrap();
    assert_eq!(initials[0].existing_types, vec!["reminder_7".to_string()]);

    let due = CampaignRepo::list_due(&pool, Utc::now()).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].campaign_type, "reminder_7");

    assert!(CampaignRepo::set_status(&pool, due[0].id, status::SKIPPED)
        .await
        .unwrap());
    assert!(CampaignRepo::list_due(&pool, Utc::now()).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn engagement_counters_track_first_event(pool: PgPool) {
    let job = seed_job(&pool, date(2024, 6, 30)).await;
    let contractor = seed_contractor(&pool, job.id, "Acme").await;
    let campaign = CampaignRepo::find_or_create(&pool, job.id, CampaignType::Initial)
        .await
        .unwrap();
    let tracking_token = Uuid::new_v4();
    let email_id = CampaignEmailRepo::create(
        &pool,
        &CreateCampaignEmail {
            campaign_id: campaign.id,
            contractor_id: contractor.id,
            recipient_email: contractor.email.clone(),
            subject: "SWMS required".to_string(),
            tracking_token,
            portal_token_id: None,
        },
    )
    .await
    .unwrap();
    CampaignEmailRepo::mark_sent(&pool, email_id, Utc::now()).await.unwrap();

    let first = Utc::now() - Duration::minutes(5);
    assert!(
        CampaignEmailRepo::record_engagement(&pool, tracking_token, TrackingKind::Open, first)
            .await
            .unwrap()
    );
    assert!(CampaignEmailRepo::record_engagement(
        &pool,
        tracking_token,
        TrackingKind::Open,
        Utc::now()
    )
    .await
    .unwrap());
    assert!(!CampaignEmailRepo::record_engagement(
        &pool,
        Uuid::new_v4(),
        TrackingKind::Click,
        Utc::now()
    )
    .await
    .unwrap());

    let email = CampaignEmailRepo::find_by_tracking_token(&pool, tracking_token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(email.status, "sent");
    assert_eq!(email.open_count, 2);
    assert_eq!(email.click_count, 0);
    assert_eq!(
        email.first_opened_at.map(|t| t.timestamp()),
        Some(first.timestamp())
    );

    TrackingEventRepo::create(&pool, tracking_token, TrackingKind::Open, None, first)
        .await
        .unwrap();
    let events = TrackingEventRepo::list_for_token(&pool, tracking_token)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "open");

    let report = SubmissionRepo::compliance_for_job(&pool, job.id).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].open_count, 2);
    assert_eq!(report[0].last_email_status.as_deref(), Some("sent"));
    assert!(report[0].latest_status.is_none());
}

// ---------------------------------------------------------------------------
// Portal tokens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn expired_portal_tokens_do_not_resolve(pool: PgPool) {
    let job = seed_job(&pool, date(2024, 6, 30)).await;
    let contractor = seed_contractor(&pool, job.id, "Acme").await;
    let now = Utc::now();

    let live_id = PortalTokenRepo::create(
        &pool,
        &CreatePortalToken {
            token: "a".repeat(64),
            contractor_id: contractor.id,
            swms_job_id: job.id,
            expires_at: now + Duration::days(30),
        },
    )
    .await
    .unwrap();
    PortalTokenRepo::create(
        &pool,
        &CreatePortalToken {
            token: "b".repeat(64),
            contractor_id: contractor.id,
            swms_job_id: job.id,
            expires_at: now - Duration::seconds(1),
        },
    )
    .await
    .unwrap();

    let access = PortalTokenRepo::find_access(&pool, &"a".repeat(64), now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(access.token_id, live_id);
    assert_eq!(access.company_name, "Acme");
    assert_eq!(access.site_name, "Harbour Tower");
    PortalTokenRepo::touch(&pool, live_id, now).await.unwrap();

    assert!(PortalTokenRepo::find_access(&pool, &"b".repeat(64), now)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Dedup and audit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn dedup_respects_cooldown_start(pool: PgPool) {
    let worker = WorkerRepo::create(
        &pool,
        &CreateWorker {
            full_name: "W".to_string(),
            email: "w@example.com".to_string(),
        },
    )
    .await
    .unwrap();
    let key = format!("worker:{}:expiry:2024-05-20", worker.id);
    NotificationDedupRepo::create(
        &pool,
        &CreateDedup::for_worker(key.clone(), NOTIFICATION_CERT_EXPIRY, worker.id, date(2024, 5, 20)),
    )
    .await
    .unwrap();

    let week_ago = Utc::now() - Duration::days(7);
    assert!(
        NotificationDedupRepo::exists_since(&pool, &key, NOTIFICATION_CERT_EXPIRY, week_ago)
            .await
            .unwrap()
    );
    assert!(
        !NotificationDedupRepo::exists_since(&pool, &key, NOTIFICATION_SWMS_CAMPAIGN, week_ago)
            .await
            .unwrap()
    );
    assert!(!NotificationDedupRepo::exists_since(
        &pool,
        &key,
        NOTIFICATION_CERT_EXPIRY,
        Utc::now() + Duration::minutes(1)
    )
    .await
    .unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn audit_list_filters_and_caps_limit(pool: PgPool) {
    for result in [AuditResult::Success, AuditResult::Failure, AuditResult::Skipped] {
        NotificationAuditRepo::create(
            &pool,
            &CreateAudit::new(NOTIFICATION_SWMS_CAMPAIGN, result)
                .recipient("ops@example.com")
                .details(serde_json::json!({ "attempt": 1 })),
        )
        .await
        .unwrap();
    }
    NotificationAuditRepo::create(
        &pool,
        &CreateAudit::new(NOTIFICATION_CERT_EXPIRY, AuditResult::Failure).error("HTTP 502"),
    )
    .await
    .unwrap();

    let failures = NotificationAuditRepo::list(
        &pool,
        &AuditQuery {
            result: Some("failure".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].notification_type, NOTIFICATION_CERT_EXPIRY);
    assert_eq!(failures[0].error_message.as_deref(), Some("HTTP 502"));

    let campaign_rows = NotificationAuditRepo::list(
        &pool,
        &AuditQuery {
            notification_type: Some(NOTIFICATION_SWMS_CAMPAIGN.to_string()),
            limit: Some(10_000),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(campaign_rows.len(), 3);
}
