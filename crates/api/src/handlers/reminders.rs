use axum::extract::State;
use axum::Json;
use sitesafe_events::scheduler::ReminderScanResult;

use crate::error::AppResult;
use crate::middleware::cron::CronAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/swms/reminders/run
pub async fn run_reminder_scan(
    State(state): State<AppState>,
    _cron: CronAuth,
) -> AppResult<Json<DataResponse<ReminderScanResult>>> {
    let result = state.reminder_scheduler()?.run().await?;
    Ok(Json(DataResponse { data: result }))
}
