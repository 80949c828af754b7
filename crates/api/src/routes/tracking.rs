use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tracking;
use crate::state::AppState;

/// Email tracking routes mounted at `/track`.
///
/// ```text
/// GET  /open/{token}   -> track_open
/// POST /events         -> record_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/open/{token}", get(tracking::track_open))
        .route("/events", post(tracking::record_event))
}
