//! SWMS campaign types, status constants and follow-up schedule math.
//!
//! A campaign is one batch of emails of a single type tied to an SWMS job.
//! The initial campaign is triggered by an operator; the three follow-ups are
//! scheduled relative to the initial send and the job's due date.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Cooldown during which a contractor is not re-sent the same campaign.
pub const CAMPAIGN_DEDUP_COOLDOWN_HOURS: i64 = 24;

/// Campaign row status values (`swms_campaigns.status`).
pub mod status {
    pub const SCHEDULED: &str = "scheduled";
    pub const SENDING: &str = "sending";
    pub const SENT: &str = "sent";
    pub const PARTIAL: &str = "partial";
    pub const FAILED: &str = "failed";
    pub const SKIPPED: &str = "skipped";
}

// ---------------------------------------------------------------------------
// CampaignType
// ---------------------------------------------------------------------------

/// The four campaign kinds sent for every SWMS job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignType {
    #[serde(rename = "initial")]
    Initial,
    #[serde(rename = "reminder_7")]
    Reminder7,
    #[serde(rename = "reminder_14")]
    Reminder14,
    #[serde(rename = "final_21")]
    Final21,
}

/// Offsets used to place a follow-up campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpOffsets {
    /// Distance from the initial send.
    pub after_initial: Duration,
    /// Distance before the job's due date.
    pub before_due: Duration,
}

impl CampaignType {
    /// Every campaign type in send order.
    pub const ALL: [CampaignType; 4] = [
        CampaignType::Initial,
        CampaignType::Reminder7,
        CampaignType::Reminder14,
        CampaignType::Final21,
    ];

    /// The types scheduled automatically after the initial campaign.
    pub const FOLLOW_UPS: [CampaignType; 3] = [
        CampaignType::Reminder7,
        CampaignType::Reminder14,
        CampaignType::Final21,
    ];

    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignType::Initial => "initial",
            CampaignType::Reminder7 => "reminder_7",
            CampaignType::Reminder14 => "reminder_14",
            CampaignType::Final21 => "final_21",
        }
    }

    /// Human-readable label used in email subjects.
    pub fn label(&self) -> &'static str {
        match self {
            CampaignType::Initial => "SWMS submission request",
            CampaignType::Reminder7 => "SWMS reminder",
            CampaignType::Reminder14 => "SWMS second reminder",
            CampaignType::Final21 => "SWMS final notice",
        }
    }

    /// Schedule offsets, or `None` for the initial campaign.
    pub fn follow_up_offsets(&self) -> Option<FollowUpOffsets> {
        let (after, before) = match self {
            CampaignType::Initial => return None,
            CampaignType::Reminder7 => (7, 7),
            CampaignType::Reminder14 => (14, 3),
            CampaignType::Final21 => (21, 1),
        };
        Some(FollowUpOffsets {
            after_initial: Duration::days(after),
            before_due: Duration::days(before),
        })
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(CampaignType::Initial),
            "reminder_7" => Ok(CampaignType::Reminder7),
            "reminder_14" => Ok(CampaignType::Reminder14),
            "final_21" => Ok(CampaignType::Final21),
            other => Err(CoreError::Validation(format!(
                "Unknown campaign type '{other}' (expected initial, reminder_7, reminder_14 or final_21)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule math
// ---------------------------------------------------------------------------

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: Date) -> Timestamp {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// When a follow-up campaign should go out.
///
/// Takes the earlier of `initial_sent_at + after_initial` and
/// `due_date - before_due`. The result may already be in the past when the
/// due date is close; callers treat such campaigns as immediately due.
/// Returns `None` for [`CampaignType::Initial`].
pub fn follow_up_date(
    campaign_type: CampaignType,
    initial_sent_at: Timestamp,
    due_date: Date,
) -> Option<Timestamp> {
    let offsets = campaign_type.follow_up_offsets()?;
    let from_initial = initial_sent_at + offsets.after_initial;
    let from_due = start_of_day(due_date) - offsets.before_due;
    Some(from_initial.min(from_due))
}

/// Whole days from `now` until the start of `due_date` (negative when overdue).
pub fn days_remaining(due_date: Date, now: Timestamp) -> i64 {
    (due_date - now.date_naive()).num_days()
}

/// Final campaign status derived from per-email outcomes.
///
/// `sent` when nothing failed, `partial` when some emails failed, `failed`
/// when every attempted email failed. A campaign where nothing was attempted
/// (everyone skipped) counts as `sent`.
pub fn summary_status(sent: u32, failed: u32) -> &'static str {
    match (sent, failed) {
        (_, 0) => status::SENT,
        (0, _) => status::FAILED,
        _ => status::PARTIAL,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
