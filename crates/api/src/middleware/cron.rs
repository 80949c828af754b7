//! Shared-secret guard for timer-triggered routes.
//!
//! Schedulers call these routes with `Authorization: Bearer <CRON_SECRET>`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sitesafe_core::error::CoreError;

use super::auth::{bearer_token, AuthUser};
use crate::auth::ROLE_ADMIN;
use crate::error::AppError;
use crate::state::AppState;

/// Caller presented the cron secret.
pub struct CronAuth;

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        if secrets_match(token, &state.config.cron_secret) {
            Ok(CronAuth)
        } else {
            Err(AppError::Core(CoreError::Unauthorized(
                "Invalid cron secret".into(),
            )))
        }
    }
}

/// Either the cron secret or an admin JWT.
pub enum CronOrAdmin {
    Cron,
    Admin(AuthUser),
}

impl FromRequestParts<AppState> for CronOrAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        if secrets_match(token, &state.config.cron_secret) {
            return Ok(CronOrAdmin::Cron);
        }

        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(CronOrAdmin::Admin(user))
    }
}

/// Length-checked comparison that does not stop at the first differing byte.
fn secrets_match(given: &str, expected: &str) -> bool {
    if expected.is_empty() || given.len() != expected.len() {
        return false;
    }
    given
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
