//! Due-date reminder windows.
//!
//! The deadline scheduler asks [`reminder_for`] on every scan; each window
//! is logged under [`Reminder::key`] so it is only ever sent once per
//! assignment.

use crate::assignment::AssignmentKind;
use crate::notifications::{target_link, NewNotification, TYPE_DUE_SOON, TYPE_OVERDUE};
use crate::types::{DbId, Timestamp};

/// Calendar days before the due date at which a reminder goes out.
pub const REMINDER_DAYS: &[i64] = &[7, 3, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reminder {
    DueIn { days: i64 },
    Overdue,
}

impl Reminder {
    /// Stable key stored in `reminder_log.reminder`.
    pub fn key(&self) -> String {
        match self {
            Self::DueIn { days } => format!("due_{days}d"),
            Self::Overdue => "overdue".to_string(),
        }
    }

    pub fn notification(
        &self,
        user_id: DbId,
        kind: AssignmentKind,
        target_id: DbId,
        title: &str,
    ) -> NewNotification {
        let (notification_type, heading, message) = match self {
            Self::DueIn { days: 1 } => (
                TYPE_DUE_SOON,
                "Due tomorrow".to_string(),
                format!("\"{title}\" is due tomorrow."),
            ),
            Self::DueIn { days } => (
                TYPE_DUE_SOON,
                format!("Due in {days} days"),
                format!("\"{title}\" is due in {days} days."),
            ),
            Self::Overdue => (
                TYPE_OVERDUE,
                "Overdue".to_string(),
                format!("\"{title}\" is past its due date."),
            ),
        };
        NewNotification {
            user_id,
            notification_type,
            title: heading,
            message,
            link: Some(target_link(kind, target_id)),
        }
    }
}

/// Which reminder, if any, applies to a due date at `now`.
///
/// Distance is measured in whole calendar days (UTC) so a scan at any hour
/// of the day lands in the same window.
pub fn reminder_for(due_date: Timestamp, now: Timestamp) -> Option<Reminder> {
    if due_date < now {
        return Some(Reminder::Overdue);
    }
    let days = (due_date.date_naive() - now.date_naive()).num_days();
    REMINDER_DAYS
        .contains(&days)
        .then_some(Reminder::DueIn { days })
}
