//! Campaign email delivery.
//!
//! [`Mailer`] is the dispatch seam used by the campaign automation. Two
//! implementations ship: [`WebhookMailer`] hands the rendered email to an
//! automation platform as signed JSON, and [`SmtpMailer`] sends it directly
//! through the `lettre` async SMTP transport.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use sitesafe_core::error::CoreError;

use crate::delivery::webhook::{WebhookClient, WebhookError};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The automation platform rejected or never received the email.
    #[error("Email webhook error: {0}")]
    Webhook(#[from] WebhookError),
}

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// Which channel carries campaign emails (`AUTOMATION_PROVIDER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutomationProvider {
    #[default]
    Webhook,
    Smtp,
}

impl AutomationProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationProvider::Webhook => "webhook",
            AutomationProvider::Smtp => "smtp",
        }
    }
}

impl fmt::Display for AutomationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationProvider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(AutomationProvider::Webhook),
            "smtp" => Ok(AutomationProvider::Smtp),
            other => Err(CoreError::Validation(format!(
                "Unknown automation provider '{other}' (expected webhook or smtp)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@sitesafe.local";

/// Configuration for the SMTP mailer.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      | —                         |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@sitesafe.local`  |
    /// | `SMTP_USER`     | no       | —                         |
    /// | `SMTP_PASSWORD` | no       | —                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// A rendered email ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Correlation data forwarded to webhook providers (campaign, contractor,
    /// tracking token). Ignored by SMTP.
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError>;
}

/// Posts each email to the automation platform, which performs the send.
pub struct WebhookMailer {
    client: WebhookClient,
    url: String,
}

impl WebhookMailer {
    pub fn new(client: WebhookClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError> {
        let payload = serde_json::json!({
            "type": "swms_campaign_email",
            "to": email.to,
            "subject": email.subject,
            "html": email.html,
            "metadata": email.metadata,
        });
        self.client.post_json(&self.url, &payload).await?;
        tracing::info!(to = %email.to, "Campaign email handed to automation webhook");
        Ok(())
    }
}

/// Sends HTML email through an SMTP relay.
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let message = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(message).await?;

        tracing::info!(to = %email.to, "Campaign email sent via SMTP");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
