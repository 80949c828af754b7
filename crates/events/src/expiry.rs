//! Certification expiry reminders.
//!
//! [`ExpiryReminderJob`] finds workers whose latest valid certification
//! expires within the next 30 days, drops anyone reminded about the same
//! expiry date in the last 7 days, and sends everyone left in one signed
//! webhook batch. Dedup rows are written before the webhook call, so a failed
//! batch is not retried on the next run.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sitesafe_core::expiry::{days_until, dedup_cutoff, ExpiryWindow, EXPIRY_WINDOW_DAYS};
use sitesafe_core::notification::{worker_expiry_dedup_key, AuditResult, NOTIFICATION_CERT_EXPIRY};
use sitesafe_core::types::{Date, DbId, Timestamp};
use sitesafe_db::models::notification::{CreateAudit, CreateDedup};
use sitesafe_db::models::worker::ExpiringCertification;

use crate::delivery::webhook::WebhookClient;
use crate::error::NotifyError;
use crate::store::{record_audit, NotificationStore};

/// Batch payload `type` field.
pub const EXPIRY_BATCH_TYPE: &str = "certification_expiry_batch";

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpiryRunResult {
    pub candidates: usize,
    pub notified: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Whether a batch reached the webhook.
    pub delivered: bool,
}

#[derive(Debug, Serialize)]
struct BatchWorker<'a> {
    worker_id: DbId,
    worker_name: &'a str,
    worker_email: &'a str,
    certification_type: &'a str,
    expiry_date: Date,
    days_until_expiry: i64,
}

#[derive(Debug, Serialize)]
struct ExpiryBatch<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    generated_at: Timestamp,
    window_days: i64,
    workers: Vec<BatchWorker<'a>>,
}

pub struct ExpiryReminderJob {
    store: Arc<dyn NotificationStore>,
    webhook: WebhookClient,
    webhook_url: String,
}

impl ExpiryReminderJob {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        webhook: WebhookClient,
        webhook_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            webhook,
            webhook_url: webhook_url.into(),
        }
    }

    pub async fn run(&self) -> Result<ExpiryRunResult, NotifyError> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: Timestamp) -> Result<ExpiryRunResult, NotifyError> {
        let today = now.date_naive();
        let window = ExpiryWindow::starting(today);
        let cutoff = dedup_cutoff(now);

        let candidates = self
            .store
            .expiring_certifications(window.start, window.end)
            .await?;

        let mut result = ExpiryRunResult {
            candidates: candidates.len(),
            ..Default::default()
        };
        let mut batch: Vec<&ExpiringCertification> = Vec::new();

        for cert in &candidates {
            let key = worker_expiry_dedup_key(cert.worker_id, cert.expiry_date);
            if self
                .store
                .dedup_exists_since(&key, NOTIFICATION_CERT_EXPIRY, cutoff)
                .await?
            {
                result.skipped += 1;
                record_audit(
                    self.store.as_ref(),
                    audit_for(cert, AuditResult::Skipped).details(serde_json::json!({
                        "expiry_date": cert.expiry_date,
                        "reason": "already notified within cooldown",
                    })),
                )
                .await;
                continue;
            }
            batch.push(cert);
        }

        if batch.is_empty() {
            tracing::info!(
                candidates = result.candidates,
                skipped = result.skipped,
                "No certification expiry reminders to send"
            );
            return Ok(result);
        }

        for cert in &batch {
            let key = worker_expiry_dedup_key(cert.worker_id, cert.expiry_date);
            self.store
                .insert_dedup(&CreateDedup::for_worker(
                    key,
                    NOTIFICATION_CERT_EXPIRY,
                    cert.worker_id,
                    cert.expiry_date,
                ))
                .await?;
        }

        let payload = ExpiryBatch {
            kind: EXPIRY_BATCH_TYPE,
            generated_at: now,
            window_days: EXPIRY_WINDOW_DAYS,
            workers: batch
                .iter()
                .map(|cert| BatchWorker {
                    worker_id: cert.worker_id,
                    worker_name: &cert.worker_name,
                    worker_email: &cert.worker_email,
                    certification_type: &cert.certification_type,
                    expiry_date: cert.expiry_date,
                    days_until_expiry: days_until(cert.expiry_date, today),
                })
                .collect(),
        };

        match self.webhook.post_json(&self.webhook_url, &payload).await {
            Ok(()) => {
                result.notified = batch.len();
                result.delivered = true;
                for cert in &batch {
                    record_audit(
                        self.store.as_ref(),
                        audit_for(cert, AuditResult::Success).details(serde_json::json!({
                            "expiry_date": cert.expiry_date,
                            "certification_type": cert.certification_type,
                        })),
                    )
                    .await;
                }
                tracing::info!(
                    notified = result.notified,
                    skipped = result.skipped,
                    "Certification expiry batch delivered"
                );
            }
            Err(e) => {
                result.failed = batch.len();
                let message = e.to_string();
                for cert in &batch {
                    record_audit(
                        self.store.as_ref(),
                        audit_for(cert, AuditResult::Failure)
                            .error(message.clone())
                            .details(serde_json::json!({ "expiry_date": cert.expiry_date })),
                    )
                    .await;
                }
                tracing::error!(
                    failed = result.failed,
                    error = %e,
                    "Certification expiry batch failed"
                );
            }
        }

        Ok(result)
    }
}

fn audit_for(cert: &ExpiringCertification, result: AuditResult) -> CreateAudit {
    CreateAudit::new(NOTIFICATION_CERT_EXPIRY, result)
        .recipient(cert.worker_email.clone())
        .worker(cert.worker_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
