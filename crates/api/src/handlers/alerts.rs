use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use sitesafe_events::alerts::{AlertReceipt, ComplianceAlertInput};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::cron::CronAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/compliance/alerts
///
/// Validates the alert and forwards it to the compliance webhook. Upstream
/// failures answer 502.
pub async fn create_alert(
    State(state): State<AppState>,
    _cron: CronAuth,
    AppJson(input): AppJson<ComplianceAlertInput>,
) -> AppResult<(StatusCode, Json<DataResponse<AlertReceipt>>)> {
    let alert = input.into_alert()?;
    let receipt = state.alert_dispatcher().dispatch(&alert).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: receipt })))
}
