//! Notification integration settings shared by the API server and the worker.

use std::sync::Arc;

use crate::campaign::CampaignLinks;
use crate::delivery::email::{AutomationProvider, EmailConfig, Mailer, SmtpMailer, WebhookMailer};
use crate::delivery::webhook::WebhookClient;
use crate::error::NotifyError;

const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_PORTAL_BASE_URL: &str = "http://localhost:5173/portal";

/// Webhook endpoints, secrets, link bases and the mail provider.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub provider: AutomationProvider,
    pub email_webhook_url: Option<String>,
    pub expiry_webhook_url: Option<String>,
    pub compliance_alert_webhook_url: Option<String>,
    /// Signs every outbound webhook body when set.
    pub webhook_signing_secret: Option<String>,
    /// Base for the tracking pixel URL embedded in emails.
    pub public_base_url: String,
    /// Base for contractor portal links.
    pub portal_base_url: String,
    pub smtp: Option<EmailConfig>,
}

impl NotifyConfig {
    /// Load from environment variables.
    ///
    /// | Variable                       | Default                        |
    /// |--------------------------------|--------------------------------|
    /// | `AUTOMATION_PROVIDER`          | `webhook`                      |
    /// | `EMAIL_WEBHOOK_URL`            | —                              |
    /// | `EXPIRY_WEBHOOK_URL`           | —                              |
    /// | `COMPLIANCE_ALERT_WEBHOOK_URL` | —                              |
    /// | `WEBHOOK_SIGNING_SECRET`       | —                              |
    /// | `PUBLIC_BASE_URL`              | `http://localhost:3000`        |
    /// | `PORTAL_BASE_URL`              | `http://localhost:5173/portal` |
    ///
    /// SMTP settings are read by [`EmailConfig::from_env`].
    pub fn from_env() -> Result<Self, NotifyError> {
        let provider = match optional_env("AUTOMATION_PROVIDER") {
            Some(value) => value.parse()?,
            None => AutomationProvider::default(),
        };

        Ok(Self {
            provider,
            email_webhook_url: optional_env("EMAIL_WEBHOOK_URL"),
            expiry_webhook_url: optional_env("EXPIRY_WEBHOOK_URL"),
            compliance_alert_webhook_url: optional_env("COMPLIANCE_ALERT_WEBHOOK_URL"),
            webhook_signing_secret: optional_env("WEBHOOK_SIGNING_SECRET"),
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
            portal_base_url: optional_env("PORTAL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PORTAL_BASE_URL.to_string()),
            smtp: EmailConfig::from_env(),
        })
    }

    pub fn webhook_client(&self) -> Result<WebhookClient, NotifyError> {
        Ok(WebhookClient::new(self.webhook_signing_secret.clone())?)
    }

    pub fn campaign_links(&self) -> CampaignLinks {
        CampaignLinks {
            public_base_url: self.public_base_url.clone(),
            portal_base_url: self.portal_base_url.clone(),
        }
    }

    /// Construct the mailer for the configured provider.
    pub fn build_mailer(&self, client: &WebhookClient) -> Result<Arc<dyn Mailer>, NotifyError> {
        match self.provider {
            AutomationProvider::Webhook => {
                let url = self
                    .email_webhook_url
                    .clone()
                    .ok_or(NotifyError::NotConfigured("EMAIL_WEBHOOK_URL"))?;
                Ok(Arc::new(WebhookMailer::new(client.clone(), url)))
            }
            AutomationProvider::Smtp => {
                let smtp = self
                    .smtp
                    .clone()
                    .ok_or(NotifyError::NotConfigured("SMTP_HOST"))?;
                Ok(Arc::new(SmtpMailer::new(smtp)))
            }
        }
    }
}

/// Read a variable, treating empty values as unset.
fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
