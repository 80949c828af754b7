//! HMAC-SHA256 webhook signing and constant-time verification.
//!
//! Outgoing payloads are signed over the exact body bytes and the signature
//! travels in the [`SIGNATURE_HEADER`] header as `sha256=<lowercase hex>`.
//! Verification decodes the hex and lets the MAC compare in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature on outbound and inbound webhooks.
pub const SIGNATURE_HEADER: &str = "x-sitesafe-signature";

/// Scheme prefix of the header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,

    #[error("signing secret is empty")]
    EmptySecret,

    #[error("invalid signature format: {0}")]
    Malformed(String),

    #[error("signature verification failed")]
    Mismatch,
}

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Lowercase hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = mac_for(secret);
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Full header value: `sha256=<hex>`.
pub fn signature_header_value(secret: &str, body: &[u8]) -> String {
    format!("{SIGNATURE_PREFIX}{}", sign(secret, body))
}

/// Verify `signature` (either `sha256=<hex>` or bare hex) for `body`.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(SignatureError::Missing);
    }

    let hex_part = signature.strip_prefix(SIGNATURE_PREFIX).unwrap_or(signature);
    let expected =
        hex::decode(hex_part).map_err(|e| SignatureError::Malformed(e.to_string()))?;

    let mut mac = mac_for(secret);
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}
