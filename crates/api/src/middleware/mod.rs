//! Request extractors enforcing authentication and rate limits.
//!
//! - [`auth::AuthUser`] -- the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`cron::CronAuth`] -- requires the cron shared secret.
//! - [`cron::CronOrAdmin`] -- cron secret or an admin token.
//! - [`rate_limit::RateLimit`] -- per-client fixed-window limit for one endpoint class.

pub mod auth;
pub mod cron;
pub mod rate_limit;
pub mod rbac;
