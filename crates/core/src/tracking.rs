//! Email engagement tracking: the open pixel and event kinds.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Transparent 1×1 GIF89a.
const PIXEL_GIF_BASE64: &str = "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

static PIXEL_GIF: LazyLock<Vec<u8>> =
    LazyLock::new(|| STANDARD.decode(PIXEL_GIF_BASE64).unwrap_or_default());

/// Bytes returned by the open-tracking endpoint for every request.
pub fn pixel_gif() -> &'static [u8] {
    PIXEL_GIF.as_slice()
}

/// URL of the open pixel for a tracking token.
pub fn pixel_url(public_base_url: &str, tracking_token: &str) -> String {
    format!(
        "{}/api/v1/track/open/{tracking_token}",
        public_base_url.trim_end_matches('/')
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingKind {
    Open,
    Click,
}

impl TrackingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingKind::Open => "open",
            TrackingKind::Click => "click",
        }
    }
}

impl fmt::Display for TrackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TrackingKind::Open),
            "click" => Ok(TrackingKind::Click),
            other => Err(CoreError::Validation(format!(
                "Unknown tracking event type '{other}' (expected open or click)"
            ))),
        }
    }
}
