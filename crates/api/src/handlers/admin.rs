//! Admin back-office: notification audit log, submission review and job
//! compliance reports. Every handler requires the `admin` role.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use sitesafe_core::error::CoreError;
use sitesafe_core::notification::AuditResult;
use sitesafe_core::report::{summarize, ComplianceTotals};
use sitesafe_core::submission::{validate_transition, SubmissionStatus};
use sitesafe_core::types::{DbId, Timestamp};
use sitesafe_db::models::campaign::SwmsCampaign;
use sitesafe_db::models::notification::{AuditQuery, NotificationAudit};
use sitesafe_db::models::submission::{
    ContractorCompliance, SwmsSubmission, UpdateSubmissionStatus,
};
use sitesafe_db::models::swms_job::SwmsJobDetail;
use sitesafe_db::repositories::{
    CampaignRepo, NotificationAuditRepo, SubmissionRepo, SwmsJobRepo,
};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Compliance snapshot of one SWMS job.
#[derive(Debug, Serialize)]
pub struct JobComplianceReport {
    pub job: SwmsJobDetail,
    pub totals: ComplianceTotals,
    pub contractors: Vec<ContractorCompliance>,
    pub campaigns: Vec<SwmsCampaign>,
    pub generated_at: Timestamp,
}

/// GET /api/v1/admin/notifications/audit
///
/// Filters: `notification_type`, `result`, `limit` (default 50, max 200),
/// `offset`.
pub async fn list_audit(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<AuditQuery>,
) -> AppResult<Json<DataResponse<Vec<NotificationAudit>>>> {
    if let Some(result) = params.result.as_deref() {
        if AuditResult::parse(result).is_none() {
            return Err(AppError::BadRequest(format!(
                "Invalid result filter '{result}'. Must be one of: success, failure, skipped"
            )));
        }
    }

    let rows = NotificationAuditRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// POST /api/v1/admin/submissions/{id}/status
pub async fn update_submission_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateSubmissionStatus>,
) -> AppResult<Json<DataResponse<SwmsSubmission>>> {
    let target: SubmissionStatus = input.status.parse()?;

    let submission = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "swms_submission",
            id,
        })?;
    let current: SubmissionStatus = submission
        .status
        .parse()
        .map_err(|_| AppError::InternalError(format!("Stored status '{}'", submission.status)))?;
    validate_transition(current, target)?;

    let notes = input
        .reviewer_notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let updated = SubmissionRepo::update_status(&state.pool, id, current, target, notes)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(format!(
                "Submission {id} changed status while being reviewed"
            ))
        })?;

    tracing::info!(
        submission_id = id,
        from = %current,
        to = %target,
        reviewer_id = admin.user_id,
        "Submission status updated"
    );
    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/admin/reports/swms-jobs/{id}
pub async fn job_report(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JobComplianceReport>>> {
    let job = SwmsJobRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "swms_job",
            id,
        })?;

    let contractors = SubmissionRepo::compliance_for_job(&state.pool, id).await?;
    let totals = summarize(contractors.iter().map(|c| {
        c.latest_status
            .as_deref()
            .and_then(|s| s.parse::<SubmissionStatus>().ok())
    }));
    let campaigns = CampaignRepo::list_for_job(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: JobComplianceReport {
            job,
            totals,
            contractors,
            campaigns,
            generated_at: Utc::now(),
        },
    }))
}
