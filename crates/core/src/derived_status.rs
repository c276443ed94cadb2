//! Display status derivation.
//!
//! The status shown on dashboards is never stored. It is computed from the
//! assignment's completion timestamp, its due date, the item progress rows
//! and the prerequisite gate, in that order of precedence.

use serde::{Deserialize, Serialize};

use crate::assignment::ItemStatus;
use crate::prerequisites::PrerequisiteState;
use crate::types::Timestamp;

pub const STATUS_NOT_STARTED: &str = "not_started";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_OVERDUE: &str = "overdue";
pub const STATUS_LOCKED: &str = "locked";
pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStatus {
    NotStarted,
    InProgress,
    Completed,
    Overdue,
    Locked,
    Pending,
}

impl DerivedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => STATUS_NOT_STARTED,
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Completed => STATUS_COMPLETED,
            Self::Overdue => STATUS_OVERDUE,
            Self::Locked => STATUS_LOCKED,
            Self::Pending => STATUS_PENDING,
        }
    }
}

impl std::fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the display status of one assignment.
///
/// Checklists pass [`PrerequisiteState::Open`]; gating only exists for
/// programs. Completion wins over everything, including an elapsed due
/// date. Overdue wins over partial progress.
pub fn resolve(
    completed_at: Option<Timestamp>,
    due_date: Option<Timestamp>,
    items: &[ItemStatus],
    gate: &PrerequisiteState,
    now: Timestamp,
) -> DerivedStatus {
    if completed_at.is_some() {
        return DerivedStatus::Completed;
    }

    match gate {
        PrerequisiteState::Locked { .. } => return DerivedStatus::Locked,
        PrerequisiteState::AwaitingApproval => return DerivedStatus::Pending,
        PrerequisiteState::Open => {}
    }

    if due_date.is_some_and(|due| due < now) {
        return DerivedStatus::Overdue;
    }

    if items.iter().any(|s| *s != ItemStatus::NotStarted) {
        return DerivedStatus::InProgress;
    }

    DerivedStatus::NotStarted
}
