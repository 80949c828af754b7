//! Contractor portal routes. Every request is rate limited per client.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::portal;
use crate::state::AppState;

/// Portal routes mounted at `/portal`.
///
/// ```text
/// GET  /{token}                     -> get_portal
/// POST /{token}/uploads/validate    -> validate_portal_upload
/// POST /{token}/submissions         -> create_submission
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(portal::get_portal))
        .route(
            "/{token}/uploads/validate",
            post(portal::validate_portal_upload),
        )
        .route("/{token}/submissions", post(portal::create_submission))
}
