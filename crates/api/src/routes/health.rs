use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub integrations: IntegrationStatus,
}

/// Which outbound integrations have an endpoint configured.
#[derive(Serialize)]
pub struct IntegrationStatus {
    pub email_provider: &'static str,
    pub email_webhook: bool,
    pub smtp: bool,
    pub expiry_webhook: bool,
    pub compliance_alert_webhook: bool,
    pub signed_webhooks: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = sitesafe_db::health_check(&state.pool).await.is_ok();
    let notify = &state.config.notify;

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        integrations: IntegrationStatus {
            email_provider: notify.provider.as_str(),
            email_webhook: notify.email_webhook_url.is_some(),
            smtp: notify.smtp.is_some(),
            expiry_webhook: notify.expiry_webhook_url.is_some(),
            compliance_alert_webhook: notify.compliance_alert_webhook_url.is_some(),
            signed_webhooks: state.webhook.is_signing(),
        },
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
