//! HTTP-level integration tests for the admin back-office routes: audit log,
//! submission review and job compliance reports.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{admin_token, body_json, build_test_app, get, post_json, user_token};
use serde_json::json;
use sitesafe_core::notification::{AuditResult, NOTIFICATION_CERT_EXPIRY, NOTIFICATION_SWMS_CAMPAIGN};
use sitesafe_db::models::contractor::{Contractor, CreateContractor};
use sitesafe_db::models::notification::CreateAudit;
use sitesafe_db::models::submission::CreateSubmission;
use sitesafe_db::models::swms_job::{CreateJobSite, CreateSwmsJob, SwmsJob};
use sitesafe_db::repositories::{
    ContractorRepo, JobSiteRepo, NotificationAuditRepo, SubmissionRepo, SwmsJobRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_job(pool: &PgPool) -> SwmsJob {
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
            due_date: (Utc::now() + Duration::days(14)).date_naive(),
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

async fn review(pool: &PgPool, submission_id: i64, status: &str) -> axum::response::Response {
    post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/admin/submissions/{submission_id}/status"),
        json!({ "status": status, "reviewer_notes": "checked" }),
        Some(&admin_token()),
    )
    .await
}

// ---------------------------------------------------------------------------
// RBAC
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_routes_require_admin_role(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(app.clone(), "/api/v1/admin/notifications/audit", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(app, "/api/v1/admin/notifications/audit", Some(&user_token())).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn audit_log_filters_by_type_and_result(pool: PgPool) {
    NotificationAuditRepo::create(
        &pool,
        &CreateAudit::new(NOTIFICATION_CERT_EXPIRY, AuditResult::Success).worker(1),
    )
    .await
    .unwrap();
    NotificationAuditRepo::create(
        &pool,
        &CreateAudit::new(NOTIFICATION_SWMS_CAMPAIGN, AuditResult::Failure).error("bounced"),
    )
    .await
    .unwrap();
    let app = build_test_app(pool);

    let all = body_json(
        get(app.clone(), "/api/v1/admin/notifications/audit", Some(&admin_token())).await,
    )
    .await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let failures = body_json(
        get(
            app.clone(),
            "/api/v1/admin/notifications/audit?result=failure",
            Some(&admin_token()),
        )
        .await,
    )
    .await;
    let rows = failures["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["notification_type"], NOTIFICATION_SWMS_CAMPAIGN);
    assert_eq!(rows[0]["error_message"], "bounced");

    let response = get(
        app,
        "/api/v1/admin/notifications/audit?result=maybe",
        Some(&admin_token()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Submission review
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn submission_review_follows_state_machine(pool: PgPool) {
    let job = seed_job(&pool).await;
    let contractor = seed_contractor(&pool, job.id, "Acme").await;
    let submission_id = submit(&pool, job.id, contractor.id).await;

    // submitted -> approved skips review.
    let response = review(&pool, submission_id, "approved").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = review(&pool, submission_id, "under_review").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = review(&pool, submission_id, "approved").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "approved");
    assert_eq!(json["data"]["reviewer_notes"], "checked");
    assert!(!json["data"]["reviewed_at"].is_null());

    // Approved is terminal.
    let response = review(&pool, submission_id, "under_review").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submission_review_rejects_unknown_status_and_id(pool: PgPool) {
    let job = seed_job(&pool).await;
    let contractor = seed_contractor(&pool, job.id, "Acme").await;
    let submission_id = submit(&pool, job.id, contractor.id).await;

    let response = review(&pool, submission_id, "archived").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = review(&pool, submission_id + 1000, "under_review").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Job report
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn job_report_summarizes_latest_statuses(pool: PgPool) {
    let job = seed_job(&pool).await;
    let approved = seed_contractor(&pool, job.id, "Acme").await;
    let pending = seed_contractor(&pool, job.id, "Bolt").await;
    let _silent = seed_contractor(&pool, job.id, "Crane").await;

    let first = submit(&pool, job.id, approved.id).await;
    review(&pool, first, "under_review").await;
    review(&pool, first, "approved").await;
    submit(&pool, job.id, pending.id).await;

    let json = body_json(
        get(
            build_test_app(pool),
            &format!("/api/v1/admin/reports/swms-jobs/{}", job.id),
            Some(&admin_token()),
        )
        .await,
    )
    .await;

    let totals = &json["data"]["totals"];
    assert_eq!(totals["assigned"], 3);
    assert_eq!(totals["approved"], 1);
    assert_eq!(totals["submitted"], 1);
    assert_eq!(totals["not_submitted"], 1);
    let rate = totals["compliance_rate"].as_f64().unwrap();
    assert!((rate - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(json["data"]["contractors"].as_array().unwrap().len(), 3);
    assert_eq!(json["data"]["job"]["site_name"], "Harbour Tower");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn job_report_for_missing_job_returns_404(pool: PgPool) {
    let response = get(
        build_test_app(pool),
        "/api/v1/admin/reports/swms-jobs/424242",
        Some(&admin_token()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
