//! Pure domain logic for the SiteSafe notification back-office.
//!
//! Nothing in this crate touches the database or the network. The `db`,
//! `events` and `api` crates build on these types and rules.

pub mod campaign;
pub mod error;
pub mod expiry;
pub mod notification;
pub mod portal_token;
pub mod rate_limit;
pub mod report;
pub mod signing;
pub mod submission;
pub mod template;
pub mod tracking;
pub mod types;
pub mod upload;
