//! Repository for the `reminder_log` table.

use sqlx::PgPool;
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::notifications::NewNotification;
use trainhub_core::types::DbId;

use crate::models::notification::Notification;
use crate::repositories::NotificationRepo;

pub struct ReminderRepo;

impl ReminderRepo {
    /// Claim a reminder window and store its notification in one
    /// transaction.
    ///
    /// Returns the notification the first time a `(kind, assignment,
    /// reminder)` triple is seen and `None` afterwards, so each window fires
    /// once. If the notification insert fails the claim is rolled back and
    /// the window is retried on the next scan.
    pub async fn record_and_notify(
        pool: &PgPool,
        kind: AssignmentKind,
        assignment_id: DbId,
        reminder: &str,
        notification: &NewNotification,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "INSERT INTO reminder_log (assignment_kind, assignment_id, reminder)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_reminder_log_window DO NOTHING",
        )
        .bind(kind.as_str())
        .bind(assignment_id)
        .bind(reminder)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;
        if !claimed {
            return Ok(None);
        }

        let stored = NotificationRepo::create_in(&mut tx, notification).await?;
        tx.commit().await?;
        Ok(Some(stored))
    }

    /// Forget the reminders of an assignment, e.g. after its due date moved.
    pub async fn clear(
        pool: &PgPool,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM reminder_log WHERE assignment_kind = $1 AND assignment_id = $2",
        )
        .bind(kind.as_str())
        .bind(assignment_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
