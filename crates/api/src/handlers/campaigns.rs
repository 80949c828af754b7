//! Handler for triggering SWMS email campaigns.

use axum::extract::State;
use axum::Json;
use sitesafe_events::campaign::{CampaignRequest, CampaignRunResult};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::cron::CronOrAdmin;
use crate::middleware::rate_limit::{EmailSend, RateLimit};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/swms/campaigns
///
/// Send (or preview with `test_mode`) one campaign for a job.
pub async fn run_campaign(
    State(state): State<AppState>,
    caller: CronOrAdmin,
    _limit: RateLimit<EmailSend>,
    AppJson(input): AppJson<CampaignRequest>,
) -> AppResult<Json<DataResponse<CampaignRunResult>>> {
    if let CronOrAdmin::Admin(user) = &caller {
        tracing::info!(
            user_id = user.user_id,
            swms_job_id = input.swms_job_id,
            "Campaign triggered by admin"
        );
    }

    let automation = state.campaign_automation()?;
    let result = automation.run(&input).await?;
    Ok(Json(DataResponse { data: result }))
}
