//! SWMS submission status and its state machine.
//!
//! ```text
//! submitted -> under_review -> approved
//!                           -> rejected
//!                           -> requires_changes -> submitted
//! ```
//!
//! `approved` and `rejected` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    RequiresChanges,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 5] = [
        SubmissionStatus::Submitted,
        SubmissionStatus::UnderReview,
        SubmissionStatus::Approved,
        SubmissionStatus::Rejected,
        SubmissionStatus::RequiresChanges,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::RequiresChanges => "requires_changes",
        }
    }

    /// Statuses reachable from `self`.
    pub fn valid_transitions(&self) -> &'static [SubmissionStatus] {
        match self {
            SubmissionStatus::Submitted => &[SubmissionStatus::UnderReview],
            SubmissionStatus::UnderReview => &[
                SubmissionStatus::Approved,
                SubmissionStatus::Rejected,
                SubmissionStatus::RequiresChanges,
            ],
            SubmissionStatus::RequiresChanges => &[SubmissionStatus::Submitted],
            SubmissionStatus::Approved | SubmissionStatus::Rejected => &[],
        }
    }

    pub fn can_transition(&self, to: SubmissionStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Whether a contractor in this status no longer needs chasing.
    ///
    /// Used by the reminder scheduler's "fully submitted" check.
    pub fn counts_as_submitted(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Submitted | SubmissionStatus::UnderReview | SubmissionStatus::Approved
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown submission status '{s}'")))
    }
}

/// Validate a transition, producing a `Conflict` for disallowed moves.
pub fn validate_transition(
    from: SubmissionStatus,
    to: SubmissionStatus,
) -> Result<(), CoreError> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid submission transition: {from} -> {to}"
        )))
    }
}
