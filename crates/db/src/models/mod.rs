//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` entity structs matching table rows or joined views
//! - `Deserialize` create DTOs for inserts

pub mod campaign;
pub mod contractor;
pub mod notification;
pub mod portal_token;
pub mod submission;
pub mod swms_job;
pub mod tracking;
pub mod worker;
