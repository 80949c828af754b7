//! Contractor portal: token resolution, upload validation and SWMS submission.
//!
//! Every route is addressed by the portal token from the campaign email. A
//! malformed, unknown or expired token answers 401.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sitesafe_core::error::CoreError;
use sitesafe_core::portal_token::is_well_formed;
use sitesafe_core::types::{Date, DbId, Timestamp};
use sitesafe_core::upload::{validate_upload, ExtractedFields, ScanOutcome, UploadDescriptor};
use sitesafe_db::models::portal_token::PortalAccess;
use sitesafe_db::models::submission::{CreateSubmission, SwmsSubmission};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::rate_limit::{
    FileUpload, PortalAccess as PortalAccessLimit, RateLimit, TokenValidation,
};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// What the contractor sees when opening their link.
#[derive(Debug, Serialize)]
pub struct PortalView {
    pub contractor_id: DbId,
    pub company_name: String,
    pub contact_name: String,
    pub swms_job_id: DbId,
    pub job_title: String,
    pub due_date: Date,
    pub site_name: String,
    pub site_address: String,
    pub already_approved: bool,
    pub expires_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct UploadValidationRequest {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Storage reference of the uploaded object, handed to the scanner.
    pub file_ref: String,
}

#[derive(Debug, Serialize)]
pub struct UploadValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    /// Absent when static checks already failed.
    pub scan: Option<ScanOutcome>,
    pub extracted_fields: ExtractedFields,
}

#[derive(Debug, Deserialize)]
pub struct SubmitSwmsRequest {
    pub file_ref: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn resolve_token(state: &AppState, token: &str) -> AppResult<PortalAccess> {
    let invalid = || CoreError::Unauthorized("Invalid or expired portal link".into());
    if !is_well_formed(token) {
        return Err(invalid().into());
    }

    let now = Utc::now();
    let access = state
        .store
        .find_portal_access(token, now)
        .await?
        .ok_or_else(invalid)?;

    if let Err(e) = state.store.touch_portal_token(access.token_id, now).await {
        tracing::warn!(token_id = access.token_id, error = %e, "Failed to touch portal token");
    }
    Ok(access)
}

fn require_file_ref(file_ref: &str) -> Result<(), CoreError> {
    if file_ref.trim().is_empty() {
        return Err(CoreError::Validation("file_ref is required".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/portal/{token}
pub async fn get_portal(
    State(state): State<AppState>,
    _limit: RateLimit<TokenValidation>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<PortalView>>> {
    let access = resolve_token(&state, &token).await?;
    let already_approved = state
        .store
        .has_approved_submission(access.swms_job_id, access.contractor_id)
        .await?;

    Ok(Json(DataResponse {
        data: PortalView {
            contractor_id: access.contractor_id,
            company_name: access.company_name,
            contact_name: access.contact_name,
            swms_job_id: access.swms_job_id,
            job_title: access.job_title,
            due_date: access.due_date,
            site_name: access.site_name,
            site_address: access.site_address,
            already_approved,
            expires_at: access.expires_at,
        },
    }))
}

/// POST /api/v1/portal/{token}/uploads/validate
///
/// Static checks first; the scanner and OCR only run on files that pass them.
pub async fn validate_portal_upload(
    State(state): State<AppState>,
    _limit: RateLimit<FileUpload>,
    Path(token): Path<String>,
    AppJson(input): AppJson<UploadValidationRequest>,
) -> AppResult<Json<DataResponse<UploadValidationResponse>>> {
    let access = resolve_token(&state, &token).await?;
    require_file_ref(&input.file_ref)?;

    let descriptor = UploadDescriptor {
        file_name: input.file_name,
        content_type: input.content_type,
        size_bytes: input.size_bytes,
    };
    let mut errors = validate_upload(&descriptor);
    let mut scan = None;
    let mut extracted_fields = ExtractedFields::new();

    if errors.is_empty() {
        let outcome = state.scanner.scan(&input.file_ref).await?;
        if outcome.clean {
            extracted_fields = state.ocr.ocr(&input.file_ref).await?;
        } else {
            tracing::warn!(
                contractor_id = access.contractor_id,
                threats = ?outcome.threats,
                "Upload failed virus scan"
            );
            errors.push("File failed virus scan".to_string());
        }
        scan = Some(outcome);
    }

    Ok(Json(DataResponse {
        data: UploadValidationResponse {
            valid: errors.is_empty(),
            errors,
            scan,
            extracted_fields,
        },
    }))
}

/// POST /api/v1/portal/{token}/submissions
pub async fn create_submission(
    State(state): State<AppState>,
    _limit: RateLimit<PortalAccessLimit>,
    Path(token): Path<String>,
    AppJson(input): AppJson<SubmitSwmsRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SwmsSubmission>>)> {
    let access = resolve_token(&state, &token).await?;
    require_file_ref(&input.file_ref)?;

    let errors = validate_upload(&UploadDescriptor {
        file_name: input.file_name.clone(),
        content_type: input.content_type,
        size_bytes: input.size_bytes,
    });
    if !errors.is_empty() {
        return Err(CoreError::Validation(errors.join("; ")).into());
    }

    if state
        .store
        .has_approved_submission(access.swms_job_id, access.contractor_id)
        .await?
    {
        return Err(CoreError::Conflict(
            "An approved SWMS already exists for this job".into(),
        )
        .into());
    }

    let submission = state
        .store
        .create_submission(&CreateSubmission {
            swms_job_id: access.swms_job_id,
            contractor_id: access.contractor_id,
            file_ref: input.file_ref,
            file_name: input.file_name,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
        })
        .await?;

    tracing::info!(
        submission_id = submission.id,
        swms_job_id = access.swms_job_id,
        contractor_id = access.contractor_id,
        "SWMS submitted"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: submission })))
}
