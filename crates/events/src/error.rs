use sitesafe_core::error::CoreError;

use crate::delivery::email::EmailError;
use crate::delivery::webhook::WebhookError;

/// Errors raised by the notification services.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Webhook delivery failed: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Email delivery failed: {0}")]
    Email(#[from] EmailError),

    /// A required integration (webhook URL, SMTP relay) has no configuration.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
