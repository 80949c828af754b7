use std::sync::Arc;

use sitesafe_core::rate_limit::RateLimiter;
use sitesafe_core::upload::{DocumentOcr, FileScanner, NoopOcr, NoopScanner};
use sitesafe_events::error::NotifyError;
use sitesafe_events::store::{NotificationStore, PgNotificationStore};
use sitesafe_events::{
    CampaignAutomation, ComplianceAlertDispatcher, ExpiryReminderJob, ReminderScheduler,
    WebhookClient,
};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (admin queries, health).
    pub pool: sitesafe_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Persistence used by the notification services and the portal.
    pub store: Arc<dyn NotificationStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub webhook: WebhookClient,
    pub scanner: Arc<dyn FileScanner>,
    pub ocr: Arc<dyn DocumentOcr>,
}

impl AppState {
    /// Production state: the store is backed by `pool`.
    pub fn new(pool: sitesafe_db::DbPool, config: ServerConfig) -> Result<Self, NotifyError> {
        let store = Arc::new(PgNotificationStore::new(pool.clone()));
        Self::with_store(pool, config, store)
    }

    pub fn with_store(
        pool: sitesafe_db::DbPool,
        config: ServerConfig,
        store: Arc<dyn NotificationStore>,
    ) -> Result<Self, NotifyError> {
        let webhook = config.notify.webhook_client()?;
        Ok(Self {
            pool,
            config: Arc::new(config),
            store,
            rate_limiter: Arc::new(RateLimiter::new()),
            webhook,
            scanner: Arc::new(NoopScanner),
            ocr: Arc::new(NoopOcr),
        })
    }

    pub fn campaign_automation(&self) -> Result<CampaignAutomation, NotifyError> {
        let mailer = self.config.notify.build_mailer(&self.webhook)?;
        Ok(CampaignAutomation::new(
            Arc::clone(&self.store),
            mailer,
            self.config.notify.campaign_links(),
        ))
    }

    pub fn reminder_scheduler(&self) -> Result<ReminderScheduler, NotifyError> {
        Ok(ReminderScheduler::new(
            Arc::clone(&self.store),
            Arc::new(self.campaign_automation()?),
        ))
    }

    pub fn expiry_job(&self) -> Result<ExpiryReminderJob, NotifyError> {
        let url = self
            .config
            .notify
            .expiry_webhook_url
            .clone()
            .ok_or(NotifyError::NotConfigured("EXPIRY_WEBHOOK_URL"))?;
        Ok(ExpiryReminderJob::new(
            Arc::clone(&self.store),
            self.webhook.clone(),
            url,
        ))
    }

    pub fn alert_dispatcher(&self) -> ComplianceAlertDispatcher {
        ComplianceAlertDispatcher::new(
            Arc::clone(&self.store),
            self.webhook.clone(),
            self.config.notify.compliance_alert_webhook_url.clone(),
        )
    }
}
