//! Compliance alerts forwarded to the automation platform.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use sitesafe_core::error::CoreError;
use sitesafe_core::notification::{AuditResult, NOTIFICATION_COMPLIANCE_ALERT};
use sitesafe_core::types::Timestamp;
use sitesafe_db::models::notification::CreateAudit;
use uuid::Uuid;
use validator::Validate;

use crate::delivery::webhook::WebhookClient;
use crate::error::NotifyError;
use crate::store::{record_audit, NotificationStore};

/// Payload `type` field.
pub const COMPLIANCE_ALERT_TYPE: &str = "compliance_alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(CoreError::Validation(format!(
                "Unknown severity '{other}' (expected low, medium, high or critical)"
            ))),
        }
    }
}

/// Inbound alert body (camelCase on the wire).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceAlertInput {
    #[validate(length(min = 1, message = "workerId is required"))]
    #[serde(deserialize_with = "string_or_number")]
    pub worker_id: String,
    #[validate(length(min = 1, message = "workerName is required"))]
    pub worker_name: String,
    #[validate(email(message = "workerEmail must be a valid email address"))]
    pub worker_email: String,
    #[validate(length(min = 1, message = "reason is required"))]
    pub reason: String,
    pub severity: Option<String>,
    pub site_name: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// Worker ids arrive either as database ids (`42`) or as external
/// references (`"W-102"`); both are carried as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::invalid_type(
            de::Unexpected::Other(json_kind(&other)),
            &"a string or number",
        )),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Number(_) => "number",
    }
}

impl ComplianceAlertInput {
    /// Field checks plus severity parsing; whitespace-only text counts as empty.
    pub fn into_alert(self) -> Result<ComplianceAlert, CoreError> {
        let trimmed = ComplianceAlertInput {
            worker_id: self.worker_id.trim().to_string(),
            worker_name: self.worker_name.trim().to_string(),
            worker_email: self.worker_email.trim().to_string(),
            reason: self.reason.trim().to_string(),
            ..self
        };
        trimmed
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let severity = match trimmed.severity.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => Severity::default(),
        };

        Ok(ComplianceAlert {
            worker_id: trimmed.worker_id,
            worker_name: trimmed.worker_name,
            worker_email: trimmed.worker_email,
            reason: trimmed.reason,
            severity,
            site_name: trimmed.site_name,
            details: trimmed.details,
        })
    }
}

/// A validated alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceAlert {
    pub worker_id: String,
    pub worker_name: String,
    pub worker_email: String,
    pub reason: String,
    pub severity: Severity,
    pub site_name: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    alert_id: Uuid,
    created_at: Timestamp,
    #[serde(flatten)]
    alert: &'a ComplianceAlert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertReceipt {
    pub alert_id: Uuid,
    pub created_at: Timestamp,
    pub severity: Severity,
}

pub struct ComplianceAlertDispatcher {
    store: Arc<dyn NotificationStore>,
    webhook: WebhookClient,
    webhook_url: Option<String>,
}

impl ComplianceAlertDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        webhook: WebhookClient,
        webhook_url: Option<String>,
    ) -> Self {
        Self {
            store,
            webhook,
            webhook_url,
        }
    }

    pub async fn dispatch(&self, alert: &ComplianceAlert) -> Result<AlertReceipt, NotifyError> {
        self.dispatch_at(alert, Utc::now()).await
    }

    pub async fn dispatch_at(
        &self,
        alert: &ComplianceAlert,
        now: Timestamp,
    ) -> Result<AlertReceipt, NotifyError> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or(NotifyError::NotConfigured("COMPLIANCE_ALERT_WEBHOOK_URL"))?;

        let payload = AlertPayload {
            kind: COMPLIANCE_ALERT_TYPE,
            alert_id: Uuid::new_v4(),
            created_at: now,
            alert,
        };
        let details = serde_json::json!({
            "alert_id": payload.alert_id,
            "worker_id": alert.worker_id,
            "severity": alert.severity,
            "reason": alert.reason,
        });
        let audit = CreateAudit::new(NOTIFICATION_COMPLIANCE_ALERT, AuditResult::Success)
            .recipient(alert.worker_email.clone())
            .details(details);

        match self.webhook.post_json(url, &payload).await {
            Ok(()) => {
                record_audit(self.store.as_ref(), audit).await;
                tracing::info!(
                    alert_id = %payload.alert_id,
                    severity = %alert.severity,
                    "Compliance alert delivered"
                );
                Ok(AlertReceipt {
                    alert_id: payload.alert_id,
                    created_at: now,
                    severity: alert.severity,
                })
            }
            Err(e) => {
                let failed = CreateAudit {
                    result: AuditResult::Failure,
                    ..audit
                }
                .error(e.to_string());
                record_audit(self.store.as_ref(), failed).await;
                tracing::error!(alert_id = %payload.alert_id, error = %e, "Compliance alert failed");
                Err(e.into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use sitesafe_core::signing::{verify, SIGNATURE_HEADER};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::delivery::webhook::WebhookError;
    use crate::store::MemoryStore;

    fn input(json: serde_json::Value) -> ComplianceAlertInput {
        serde_json::from_value(json).unwrap()
    }

    fn valid() -> serde_json::Value {
        serde_json::json!({
            "workerId": "w-17",
            "workerName": "Ana Silva",
            "workerEmail": "ana@example.com",
            "reason": "White Card expired",
            "siteName": "Harbour Tower"
        })
    }

    #[test]
    fn severity_defaults_to_medium() {
        let alert = input(valid()).into_alert().unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert_eq!(alert.site_name.as_deref(), Some("Harbour Tower"));
    }

    #[test]
    fn numeric_worker_id_is_kept_as_text() {
        let mut json = valid();
        json["workerId"] = 42.into();
        let alert = input(json).into_alert().unwrap();
        assert_eq!(alert.worker_id, "42");

        let mut json = valid();
        json["workerId"] = serde_json::json!(["w-17"]);
        assert!(serde_json::from_value::<ComplianceAlertInput>(json).is_err());
    }

    #[test]
    fn rejects_invalid_fields() {
        let mut bad_email = valid();
        bad_email["workerEmail"] = "not-an-email".into();
        assert_matches!(input(bad_email).into_alert(), Err(CoreError::Validation(_)));

        let mut blank_reason = valid();
        blank_reason["reason"] = "   ".into();
        assert_matches!(input(blank_reason).into_alert(), Err(CoreError::Validation(_)));

        let mut bad_severity = valid();
        bad_severity["severity"] = "urgent".into();
        assert_matches!(input(bad_severity).into_alert(), Err(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn delivers_signed_payload_and_audits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let client = WebhookClient::new(Some("alert-secret".to_string())).unwrap();
        let dispatcher = ComplianceAlertDispatcher::new(store.clone(), client, Some(server.uri()));

        let mut json = valid();
        json["severity"] = "critical".into();
        let alert = input(json).into_alert().unwrap();
        let receipt = dispatcher.dispatch(&alert).await.unwrap();
        assert_eq!(receipt.severity, Severity::Critical);

        let requests = server.received_requests().await.unwrap();
        let request = &requests[0];
        let signature = request.headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
        assert!(verify("alert-secret", &request.body, signature).is_ok());

        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["type"], COMPLIANCE_ALERT_TYPE);
        assert_eq!(body["severity"], "critical");
        assert_eq!(body["worker_email"], "ana@example.com");
        assert_eq!(body["alert_id"], receipt.alert_id.to_string());

        let audits = store.audits();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].notification_type, NOTIFICATION_COMPLIANCE_ALERT);
        assert_eq!(audits[0].result, "success");
    }

    #[tokio::test]
    async fn upstream_failure_is_returned_and_audited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let client = WebhookClient::new(None)
            .unwrap()
            .with_retry_delays(vec![Duration::ZERO]);
        let dispatcher = ComplianceAlertDispatcher::new(store.clone(), client, Some(server.uri()));

        let alert = input(valid()).into_alert().unwrap();
        assert_matches!(
            dispatcher.dispatch(&alert).await,
            Err(NotifyError::Webhook(WebhookError::HttpStatus(404)))
        );
        let audits = store.audits();
        assert_eq!(audits[0].result, "failure");
        assert!(audits[0].error_message.is_some());
    }

    #[tokio::test]
    async fn missing_url_is_not_configured() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher =
            ComplianceAlertDispatcher::new(store, WebhookClient::new(None).unwrap(), None);
        let alert = input(valid()).into_alert().unwrap();
        assert_matches!(
            dispatcher.dispatch(&alert).await,
            Err(NotifyError::NotConfigured("COMPLIANCE_ALERT_WEBHOOK_URL"))
        );
    }
}
