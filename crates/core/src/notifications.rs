//! Well-known notification type constants and message builders.
//!
//! These must match the values stored in the `notifications.type` column
//! and read by the notification list in the learner UI.

use crate::assignment::AssignmentKind;
use crate::types::DbId;

/// A program or checklist was assigned to the user.
pub const TYPE_ASSIGNMENT: &str = "assignment";

/// A due date is 7, 3 or 1 days away.
pub const TYPE_DUE_SOON: &str = "due_soon";

/// A due date has passed without completion.
pub const TYPE_OVERDUE: &str = "overdue";

/// A badge was awarded for completing a program.
pub const TYPE_BADGE: &str = "badge";

/// Postgres channel the `notifications` insert trigger publishes on.
pub const PG_CHANNEL: &str = "notifications";

/// A notification row before it has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: DbId,
    pub notification_type: &'static str,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

/// Learner-facing link to an assigned program or checklist.
pub fn target_link(kind: AssignmentKind, target_id: DbId) -> String {
    match kind {
        AssignmentKind::Program => format!("/programs/{target_id}"),
        AssignmentKind::Checklist => format!("/checklists/{target_id}"),
    }
}

pub fn assignment_notification(
    user_id: DbId,
    kind: AssignmentKind,
    target_id: DbId,
    title: &str,
) -> NewNotification {
    NewNotification {
        user_id,
        notification_type: TYPE_ASSIGNMENT,
        title: format!("New {} assigned", kind.as_str()),
        message: format!("You have been assigned \"{title}\"."),
        link: Some(target_link(kind, target_id)),
    }
}

pub fn badge_notification(user_id: DbId, program_id: DbId, badge_title: &str) -> NewNotification {
    NewNotification {
        user_id,
        notification_type: TYPE_BADGE,
        title: "Badge earned".to_string(),
        message: format!("You earned the \"{badge_title}\" badge."),
        link: Some(target_link(AssignmentKind::Program, program_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_per_kind() {
        assert_eq!(target_link(AssignmentKind::Program, 4), "/programs/4");
        assert_eq!(target_link(AssignmentKind::Checklist, 9), "/checklists/9");
    }

    #[test]
    fn test_assignment_notification_mentions_title() {
        let n = assignment_notification(3, AssignmentKind::Checklist, 8, "First week");
        assert_eq!(n.notification_type, TYPE_ASSIGNMENT);
        assert_eq!(n.title, "New checklist assigned");
        assert!(n.message.contains("First week"));
        assert_eq!(n.link.as_deref(), Some("/checklists/8"));
    }
}
