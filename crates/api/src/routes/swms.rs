use axum::routing::post;
use axum::Router;

use crate::handlers::{campaigns, reminders};
use crate::state::AppState;

/// SWMS campaign routes mounted at `/swms`.
///
/// ```text
/// POST /campaigns         -> run_campaign
/// POST /reminders/run     -> run_reminder_scan
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/campaigns", post(campaigns::run_campaign))
        .route("/reminders/run", post(reminders::run_reminder_scan))
}
