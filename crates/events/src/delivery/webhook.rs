//! Signed JSON webhook delivery with bounded retry.
//!
//! [`WebhookClient`] serializes a payload once, signs the exact body bytes
//! with HMAC-SHA256 when a signing secret is configured, and POSTs it. Each
//! attempt is capped at 20 s. Network errors, timeouts, HTTP 429 and 5xx are
//! retried twice (after 300 ms, then 900 ms); other statuses fail at once.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use sitesafe_core::signing::{signature_header_value, SIGNATURE_HEADER};

/// Delays before the second and third attempts.
const RETRY_DELAYS: [Duration; 2] = [Duration::from_millis(300), Duration::from_millis(900)];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl WebhookError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WebhookError::Request(_) => true,
            WebhookError::HttpStatus(status) => *status == 429 || *status >= 500,
            WebhookError::Serialize(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// WebhookClient
// ---------------------------------------------------------------------------

/// Posts signed JSON payloads to automation platform webhooks.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    signing_secret: Option<String>,
    retry_delays: Vec<Duration>,
}

impl WebhookClient {
    /// Build a client. An empty `signing_secret` is treated as absent.
    pub fn new(signing_secret: Option<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            signing_secret: signing_secret.filter(|s| !s.is_empty()),
            retry_delays: RETRY_DELAYS.to_vec(),
        })
    }

    /// Override the backoff schedule; the number of delays is the retry count.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn is_signing(&self) -> bool {
        self.signing_secret.is_some()
    }

    /// POST `payload` as JSON to `url`, retrying transient failures.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<(), WebhookError> {
        let body = serde_json::to_vec(payload)?;
        let signature = self
            .signing_secret
            .as_deref()
            .map(|secret| signature_header_value(secret, &body));

        let mut attempt = 0;
        loop {
            match self.try_send(url, &body, signature.as_deref()).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.retry_delays.len() => {
                    let delay = self.retry_delays[attempt];
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        url,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        attempts = attempt + 1,
                        url,
                        error = %e,
                        "Webhook delivery failed"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(
        &self,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), WebhookError> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
