pub mod admin;
pub mod certifications;
pub mod compliance;
pub mod health;
pub mod portal;
pub mod swms;
pub mod tracking;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /swms/campaigns                                  run a campaign (cron or admin)
/// /swms/reminders/run                              scan due follow-ups (cron)
///
/// /certifications/expiry-reminders/run             expiry webhook batch (cron)
///
/// /compliance/alerts                               raise a compliance alert (cron)
///
/// /track/open/{token}                              open pixel (public)
/// /track/events                                    provider events (signed)
///
/// /portal/{token}                                  contractor portal view
/// /portal/{token}/uploads/validate                 pre-submission upload checks
/// /portal/{token}/submissions                      submit a SWMS
///
/// /admin/notifications/audit                       audit log (admin only)
/// /admin/submissions/{id}/status                   review a submission
/// /admin/reports/swms-jobs/{id}                    job compliance report
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/swms", swms::router())
        .nest("/certifications", certifications::router())
        .nest("/compliance", compliance::router())
        .nest("/track", tracking::router())
        // Contractor-facing, addressed by portal token.
        .nest("/portal", portal::router())
        .nest("/admin", admin::router())
}
