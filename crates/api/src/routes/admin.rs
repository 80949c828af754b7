use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET  /notifications/audit        -> list_audit
/// POST /submissions/{id}/status    -> update_submission_status
/// GET  /reports/swms-jobs/{id}     -> job_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications/audit", get(admin::list_audit))
        .route(
            "/submissions/{id}/status",
            post(admin::update_submission_status),
        )
        .route("/reports/swms-jobs/{id}", get(admin::job_report))
}
