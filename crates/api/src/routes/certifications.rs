use axum::routing::post;
use axum::Router;

use crate::handlers::expiry;
use crate::state::AppState;

/// Certification routes mounted at `/certifications`.
///
/// ```text
/// POST /expiry-reminders/run   -> run_expiry_reminders
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/expiry-reminders/run",
        post(expiry::run_expiry_reminders),
    )
}
