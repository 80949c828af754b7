//! Contractor portal tokens.
//!
//! A portal token is a random, time-limited identifier that lets a contractor
//! open the SWMS submission form without a full account.

use chrono::Duration;
use rand::RngCore;

use crate::types::Timestamp;

/// Random bytes per token (hex-encoded to twice this many characters).
pub const PORTAL_TOKEN_BYTES: usize = 32;

/// Token lifetime from issue.
pub const PORTAL_TOKEN_TTL_DAYS: i64 = 30;

/// A freshly issued token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Issue a new token valid for [`PORTAL_TOKEN_TTL_DAYS`] from `now`.
pub fn generate_portal_token(now: Timestamp) -> PortalToken {
    let mut bytes = [0u8; PORTAL_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    PortalToken {
        token: hex::encode(bytes),
        expires_at: now + Duration::days(PORTAL_TOKEN_TTL_DAYS),
    }
}

/// Whether a token with this expiry is no longer usable at `now`.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now >= expires_at
}

/// Cheap shape check run before any database lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == PORTAL_TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Link embedded in campaign emails.
pub fn portal_url(base_url: &str, token: &str) -> String {
    format!("{}/{token}", base_url.trim_end_matches('/'))
}
