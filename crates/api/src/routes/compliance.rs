use axum::routing::post;
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

/// Compliance routes mounted at `/compliance`.
///
/// ```text
/// POST /alerts   -> create_alert
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/alerts", post(alerts::create_alert))
}
