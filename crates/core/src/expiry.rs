//! Certification expiry windows and reminder cooldowns.

use chrono::Duration;

use crate::types::{Date, Timestamp};

/// Certifications expiring within this many days of today are reminded.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// A worker is not reminded again about the same expiry within this period.
pub const EXPIRY_DEDUP_COOLDOWN_DAYS: i64 = 7;

/// Inclusive `[start, end]` date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    pub start: Date,
    pub end: Date,
}

impl ExpiryWindow {
    /// `[today, today + EXPIRY_WINDOW_DAYS]`.
    pub fn starting(today: Date) -> Self {
        Self {
            start: today,
            end: today + Duration::days(EXPIRY_WINDOW_DAYS),
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Earliest dedup timestamp that still suppresses a send at `now`.
pub fn dedup_cutoff(now: Timestamp) -> Timestamp {
    now - Duration::days(EXPIRY_DEDUP_COOLDOWN_DAYS)
}

pub fn days_until(expiry: Date, today: Date) -> i64 {
    (expiry - today).num_days()
}
