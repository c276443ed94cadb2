//! Due-date reminder scheduler.
//!
//! [`DeadlineScheduler`] runs as a background task. Every tick it loads the
//! open user assignments due within the widest reminder window (or already
//! overdue), works out which window applies and stores a notification the
//! first time that window is seen for the assignment. The window claim and
//! the notification are written in one transaction. The notification
//! insert trigger takes care of pushing it to connected clients.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::reminders::{reminder_for, REMINDER_DAYS};
use trainhub_core::types::{DbId, Timestamp};
use trainhub_db::models::assignment::AssignmentRow;
use trainhub_db::repositories::{AssignmentRepo, ChecklistRepo, ProgramRepo, ReminderRepo};
use trainhub_db::DbPool;

/// Default poll interval.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// DeadlineScheduler
// ---------------------------------------------------------------------------

pub struct DeadlineScheduler {
    pool: DbPool,
    interval: Duration,
}

impl DeadlineScheduler {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the scheduler loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Deadline scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.scan(chrono::Utc::now()).await {
                        Ok(0) => {}
                        Ok(sent) => tracing::info!(sent, "Deadline reminders sent"),
                        Err(e) => tracing::error!(error = %e, "Deadline scan failed"),
                    }
                }
            }
        }
    }

    /// Evaluate every open assignment against `now`. Returns the number of
    /// notifications stored.
    pub async fn scan(&self, now: Timestamp) -> Result<usize, sqlx::Error> {
        let widest = REMINDER_DAYS.iter().copied().max().unwrap_or(0);
        let horizon = now + chrono::Duration::days(widest + 1);

        let mut sent = 0;
        for kind in [AssignmentKind::Program, AssignmentKind::Checklist] {
            for row in AssignmentRepo::list_due_open(&self.pool, kind, horizon).await? {
                match self.remind(kind, &row, now).await {
                    Ok(true) => sent += 1,
                    Ok(false) => {}
                    Err(e) => tracing::error!(
                        kind = kind.as_str(),
                        assignment_id = row.id,
                        error = %e,
                        "Failed to send deadline reminder",
                    ),
                }
            }
        }
        Ok(sent)
    }

    async fn remind(
        &self,
        kind: AssignmentKind,
        row: &AssignmentRow,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let (Some(user_id), Some(due_date)) = (row.assigned_to_user_id, row.due_date) else {
            return Ok(false);
        };
        let Some(reminder) = reminder_for(due_date, now) else {
            return Ok(false);
        };
        let Some(title) = self.target_title(kind, row.target_id).await? else {
            return Ok(false);
        };
        let notification = reminder.notification(user_id, kind, row.target_id, &title);
        let stored =
            ReminderRepo::record_and_notify(&self.pool, kind, row.id, &reminder.key(), &notification)
                .await?;
        if stored.is_none() {
            return Ok(false);
        }
        tracing::debug!(
            kind = kind.as_str(),
            assignment_id = row.id,
            user_id,
            reminder = %reminder.key(),
            "Deadline reminder stored",
        );
        Ok(true)
    }

    async fn target_title(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        Ok(match kind {
            AssignmentKind::Program => ProgramRepo::find_by_id(&self.pool, target_id)
                .await?
                .map(|p| p.title),
            AssignmentKind::Checklist => ChecklistRepo::find_by_id(&self.pool, target_id)
                .await?
                .map(|c| c.title),
        })
    }
}
