//! SiteSafe notification services.
//!
//! - [`ExpiryReminderJob`]: certification expiry batches sent to a webhook.
//! - [`CampaignAutomation`]: SWMS request and reminder emails per job.
//! - [`ReminderScheduler`]: follow-up scheduling and the due-campaign scan.
//! - [`ComplianceAlertDispatcher`]: signed compliance alerts.
//! - [`delivery`]: outbound channels (signed webhooks, email).
//! - [`store`]: the persistence seam shared by all of the above.

pub mod alerts;
pub mod campaign;
pub mod config;
pub mod delivery;
pub mod error;
pub mod expiry;
pub mod scheduler;
pub mod store;

pub use alerts::{ComplianceAlert, ComplianceAlertDispatcher, ComplianceAlertInput, Severity};
pub use campaign::{CampaignAutomation, CampaignLinks, CampaignRequest, CampaignRunResult};
pub use config::NotifyConfig;
pub use delivery::email::{EmailConfig, Mailer, OutboundEmail};
pub use delivery::webhook::WebhookClient;
pub use error::NotifyError;
pub use expiry::{ExpiryReminderJob, ExpiryRunResult};
pub use scheduler::{ReminderScanResult, ReminderScheduler};
pub use store::{MemoryStore, NotificationStore, PgNotificationStore};
