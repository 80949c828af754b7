//! Fixed-window rate limiting keyed by client identifier.
//!
//! Each endpoint class has its own `(window, max_requests)` pair. Counters
//! live in a process-local concurrent map and are swept lazily; with several
//! server instances each one enforces its own limit, so the limiter is
//! best-effort abuse mitigation only. A shared TTL counter store would be
//! required for a global limit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;

use crate::types::Timestamp;

/// Expired entries are swept once every this many checks.
const SWEEP_EVERY: u64 = 100;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A fixed window and the number of requests allowed inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitConfig {
    pub const fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// Endpoint classes with distinct limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    FileUpload,
    TokenValidation,
    EmailSend,
    PortalAccess,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::FileUpload => "file_upload",
            EndpointClass::TokenValidation => "token_validation",
            EndpointClass::EmailSend => "email_send",
            EndpointClass::PortalAccess => "portal_access",
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        match self {
            EndpointClass::FileUpload => RateLimitConfig::new(Duration::from_secs(60), 10),
            EndpointClass::TokenValidation => RateLimitConfig::new(Duration::from_secs(60), 20),
            EndpointClass::EmailSend => RateLimitConfig::new(Duration::from_secs(3600), 50),
            EndpointClass::PortalAccess => RateLimitConfig::new(Duration::from_secs(900), 100),
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub success: bool,
    pub blocked: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Timestamp,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, at least 1 when blocked.
    pub fn retry_after_secs(&self, now: Timestamp) -> u64 {
        let secs = (self.reset_at - now).num_seconds().max(0) as u64;
        if self.blocked {
            secs.max(1)
        } else {
            secs
        }
    }
}

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    reset_at: Timestamp,
    count: u32,
}

/// Process-local fixed-window counter map.
///
/// Designed to be wrapped in `Arc` and shared across handlers.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request for `class` from `client_id` against the class limit.
    pub fn check_class(&self, class: EndpointClass, client_id: &str) -> RateLimitDecision {
        let key = format!("{}:{client_id}", class.as_str());
        self.check(&key, class.config())
    }

    /// Count a request for `key` at the current time.
    pub fn check(&self, key: &str, config: RateLimitConfig) -> RateLimitDecision {
        self.check_at(key, config, Utc::now())
    }

    /// Count a request for `key` at `now`.
    ///
    /// The first `max_requests` calls inside a window succeed; every later call
    /// in the same window is blocked with `remaining = 0`. The counter starts
    /// over once `now` reaches the window's reset time.
    pub fn check_at(&self, key: &str, config: RateLimitConfig, now: Timestamp) -> RateLimitDecision {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep(now);
        }

        let window = chrono::Duration::from_std(config.window)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(WindowEntry {
                reset_at: now + window,
                count: 0,
            });

        if now >= entry.reset_at {
            entry.reset_at = now + window;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        let blocked = entry.count > config.max_requests;

        RateLimitDecision {
            success: !blocked,
            blocked,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    /// Drop every entry whose window has ended.
    pub fn sweep(&self, now: Timestamp) {
        self.entries.retain(|_, entry| entry.reset_at > now);
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
