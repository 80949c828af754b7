//! Request handlers.
//!
//! Notification triggers delegate to the services in `sitesafe_events`;
//! admin endpoints query `sitesafe_db` repositories directly. Errors map to
//! HTTP responses via [`AppError`](crate::error::AppError).

pub mod admin;
pub mod alerts;
pub mod campaigns;
pub mod expiry;
pub mod portal;
pub mod reminders;
pub mod tracking;
