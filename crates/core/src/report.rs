//! Per-job SWMS compliance aggregation.
//!
//! Input is the latest submission status of every contractor assigned to a
//! job (`None` when the contractor has not submitted anything).

use serde::Serialize;

use crate::submission::SubmissionStatus;

/// Counts per status plus the approved share of assigned contractors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceTotals {
    pub assigned: u32,
    pub approved: u32,
    pub under_review: u32,
    pub submitted: u32,
    pub requires_changes: u32,
    pub rejected: u32,
    pub not_submitted: u32,
    /// `approved / assigned`, `0.0` when nobody is assigned.
    pub compliance_rate: f64,
}

pub fn summarize<I>(latest_statuses: I) -> ComplianceTotals
where
    I: IntoIterator<Item = Option<SubmissionStatus>>,
{
    let mut totals = ComplianceTotals::default();
    for status in latest_statuses {
        totals.assigned += 1;
        match status {
            None => totals.not_submitted += 1,
            Some(SubmissionStatus::Submitted) => totals.submitted += 1,
            Some(SubmissionStatus::UnderReview) => totals.under_review += 1,
            Some(SubmissionStatus::Approved) => totals.approved += 1,
            Some(SubmissionStatus::Rejected) => totals.rejected += 1,
            Some(SubmissionStatus::RequiresChanges) => totals.requires_changes += 1,
        }
    }
    if totals.assigned > 0 {
        totals.compliance_rate = f64::from(totals.approved) / f64::from(totals.assigned);
    }
    totals
}

/// Whether every assigned contractor has a submission that needs no chasing.
///
/// A job with no assigned contractors is not fully submitted.
pub fn is_fully_submitted<I>(latest_statuses: I) -> bool
where
    I: IntoIterator<Item = Option<SubmissionStatus>>,
{
    let mut any = false;
    for status in latest_statuses {
        if !status.is_some_and(|s| s.counts_as_submitted()) {
            return false;
        }
        any = true;
    }
    any
}
