use axum::extract::State;
use axum::Json;
use sitesafe_events::expiry::ExpiryRunResult;

use crate::error::AppResult;
use crate::middleware::cron::CronAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/certifications/expiry-reminders/run
///
/// A failed webhook batch still answers 200 with `delivered: false`; the
/// failure is recorded in the audit log.
pub async fn run_expiry_reminders(
    State(state): State<AppState>,
    _cron: CronAuth,
) -> AppResult<Json<DataResponse<ExpiryRunResult>>> {
    let result = state.expiry_job()?.run().await?;
    Ok(Json(DataResponse { data: result }))
}
