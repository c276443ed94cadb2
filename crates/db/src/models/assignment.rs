//! Assignment and item progress rows.
//!
//! Program and checklist tables are read through the same row types; the
//! target and item columns are aliased to `target_id` / `item_id` in the
//! repositories.

use sqlx::types::Json;
use sqlx::FromRow;
use trainhub_core::assignment::{AssignmentKind, AssignmentState, ItemStatus, Recipient};
use trainhub_core::engine::{Assignment, ItemProgress};
use trainhub_core::quiz::QuizOutcome;
use trainhub_core::types::{DbId, Timestamp};

/// A row from `program_assignments` or `checklist_assignments`.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: DbId,
    pub target_id: DbId,
    pub assigned_to_user_id: Option<DbId>,
    pub assigned_to_department_id: Option<DbId>,
    pub status: String,
    pub assigned_by: Option<DbId>,
    pub assigned_at: Timestamp,
    pub due_date: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub progress_pct: i16,
    pub is_auto_assigned: bool,
}

impl AssignmentRow {
    pub fn into_assignment(self, kind: AssignmentKind) -> Result<Assignment, String> {
        Ok(Assignment {
            id: self.id,
            kind,
            target_id: self.target_id,
            recipient: Recipient::from_columns(
                self.assigned_to_user_id,
                self.assigned_to_department_id,
            )?,
            status: AssignmentState::from_str_value(&self.status)?,
            assigned_by: self.assigned_by,
            assigned_at: self.assigned_at,
            due_date: self.due_date,
            completed_at: self.completed_at,
            progress_pct: self.progress_pct,
            is_auto_assigned: self.is_auto_assigned,
        })
    }
}

/// A row from `user_progress` or `checklist_item_status`. Checklist rows
/// never carry quiz columns.
#[derive(Debug, Clone, FromRow)]
pub struct ItemProgressRow {
    pub assignment_id: DbId,
    pub item_id: DbId,
    pub status: String,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub time_spent_secs: i64,
    pub score: Option<i16>,
    pub correct_count: Option<i32>,
    pub total_count: Option<i32>,
    pub passed: Option<bool>,
    pub answers: Option<Json<Vec<usize>>>,
}

impl ItemProgressRow {
    pub fn into_progress(self) -> Result<ItemProgress, String> {
        let quiz = match (self.score, self.correct_count, self.total_count, self.passed) {
            (Some(score), Some(correct_count), Some(total_count), Some(passed)) => {
                Some(QuizOutcome {
                    answers: self.answers.map(|a| a.0).unwrap_or_default(),
                    correct_count,
                    total_count,
                    score,
                    passed,
                })
            }
            _ => None,
        };
        Ok(ItemProgress {
            assignment_id: self.assignment_id,
            item_id: self.item_id,
            status: ItemStatus::from_str_value(&self.status)?,
            started_at: self.started_at,
            completed_at: self.completed_at,
            time_spent_secs: self.time_spent_secs,
            quiz,
        })
    }
}
