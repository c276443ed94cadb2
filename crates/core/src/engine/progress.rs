//! Learner progress: starting and completing items, quiz submissions,
//! aggregate percentage, completion and badges.

use chrono::Utc;
use serde::Serialize;

use crate::assignment::{progress_percentage, AssignmentKind, AssignmentState, ItemStatus};
use crate::error::CoreError;
use crate::identity::Actor;
use crate::notifications::badge_notification;
use crate::prerequisites::PrerequisiteState;
use crate::quiz::{self, QuizOutcome};
use crate::types::DbId;

use super::store::{Assignment, AssignmentStateUpdate, ItemProgress, TargetRecord};
use super::LearningEngine;

/// What the learner reports when finishing an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemOutcome {
    pub time_spent_secs: i64,
    pub quiz: Option<QuizOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionResult {
    pub item: ItemProgress,
    pub progress_pct: i16,
    pub assignment_completed: bool,
    pub badge_awarded: bool,
}

impl LearningEngine {
    /// Mark an item as opened. Re-opening keeps the original start time and
    /// never demotes a completed item.
    pub async fn start_item(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        assignment_id: DbId,
        item_id: DbId,
    ) -> Result<ItemProgress, CoreError> {
        let (assignment, target) = self.load_own_assignment(actor, kind, assignment_id).await?;
        self.ensure_item(&target, item_id).await?;
        self.ensure_open(&assignment, &target).await?;

        let mut row = self.current_row(&assignment, item_id).await?;
        if row.status == ItemStatus::NotStarted {
            row.status = ItemStatus::InProgress;
        }
        row.started_at.get_or_insert_with(Utc::now);
        self.store.save_item_progress(kind, &row).await?;

        if matches!(
            assignment.status,
            AssignmentState::Assigned | AssignmentState::Available
        ) {
            let update = AssignmentStateUpdate {
                status: AssignmentState::InProgress,
                progress_pct: assignment.progress_pct,
                completed_at: assignment.completed_at,
            };
            self.store
                .update_assignment_state(kind, assignment.id, &update)
                .await?;
        }

        Ok(row)
    }

    /// Complete an item with the learner's outcome.
    ///
    /// Graded program modules must go through [`Self::submit_quiz`].
    pub async fn complete_item(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        assignment_id: DbId,
        item_id: DbId,
        outcome: ItemOutcome,
    ) -> Result<CompletionResult, CoreError> {
        let (assignment, target) = self.load_own_assignment(actor, kind, assignment_id).await?;
        self.ensure_item(&target, item_id).await?;
        self.ensure_open(&assignment, &target).await?;

        if kind == AssignmentKind::Program && outcome.quiz.is_none() {
            let graded = self
                .store
                .find_module_content(target.id, item_id)
                .await?
                .is_some_and(|content| content.is_graded());
            if graded {
                return Err(CoreError::Validation(format!(
                    "Module {item_id} is a quiz; submit answers to complete it"
                )));
            }
        }

        self.apply_completion(&assignment, &target, item_id, outcome)
            .await
    }

    /// Grade a quiz or question module and record the attempt. A failed
    /// attempt leaves the module in progress; retries are unlimited.
    pub async fn submit_quiz(
        &self,
        actor: &Actor,
        assignment_id: DbId,
        item_id: DbId,
        answers: &[usize],
        time_spent_secs: i64,
    ) -> Result<CompletionResult, CoreError> {
        let kind = AssignmentKind::Program;
        let (assignment, target) = self.load_own_assignment(actor, kind, assignment_id).await?;
        self.ensure_item(&target, item_id).await?;
        self.ensure_open(&assignment, &target).await?;

        let content = self
            .store
            .find_module_content(target.id, item_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "module",
                id: item_id,
            })?;
        let graded =
            quiz::grade(&content, answers, target.passing_score).map_err(CoreError::Validation)?;

        tracing::debug!(
            assignment_id,
            item_id,
            score = graded.score,
            passed = graded.passed,
            "Quiz graded",
        );

        let outcome = ItemOutcome {
            time_spent_secs,
            quiz: Some(graded),
        };
        self.apply_completion(&assignment, &target, item_id, outcome)
            .await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn apply_completion(
        &self,
        assignment: &Assignment,
        target: &TargetRecord,
        item_id: DbId,
        outcome: ItemOutcome,
    ) -> Result<CompletionResult, CoreError> {
        if outcome.time_spent_secs < 0 {
            return Err(CoreError::Validation(
                "time_spent_secs must not be negative".to_string(),
            ));
        }

        let kind = assignment.kind;
        let now = Utc::now();
        let mut rows = self.store.item_progress(kind, assignment.id).await?;
        let idx = match rows.iter().position(|r| r.item_id == item_id) {
            Some(idx) => idx,
            None => {
                rows.push(ItemProgress::not_started(assignment.id, item_id));
                rows.len() - 1
            }
        };

        let row = &mut rows[idx];
        let passed = outcome.quiz.as_ref().map_or(true, |q| q.passed);
        row.time_spent_secs += outcome.time_spent_secs;
        row.started_at.get_or_insert(now);
        if passed || row.status != ItemStatus::Completed {
            if let Some(quiz) = outcome.quiz {
                row.quiz = Some(quiz);
            }
        }
        if passed {
            row.status = ItemStatus::Completed;
            row.completed_at.get_or_insert(now);
        } else if row.status == ItemStatus::NotStarted {
            row.status = ItemStatus::InProgress;
        }
        let item = row.clone();
        self.store.save_item_progress(kind, &item).await?;

        let total = rows.len();
        let completed = rows
            .iter()
            .filter(|r| r.status == ItemStatus::Completed)
            .count();
        let progress_pct = progress_percentage(completed, total);
        let all_done = total > 0 && completed == total;

        let completed_at = assignment.completed_at.or(all_done.then_some(now));
        let update = AssignmentStateUpdate {
            status: if completed_at.is_some() {
                AssignmentState::Completed
            } else {
                AssignmentState::InProgress
            },
            progress_pct,
            completed_at,
        };
        self.store
            .update_assignment_state(kind, assignment.id, &update)
            .await?;

        let mut badge_awarded = false;
        if all_done && kind == AssignmentKind::Program {
            if let (Some(title), Some(user_id)) = (&target.badge_title, assignment.user_id()) {
                badge_awarded = self.store.award_badge(user_id, target.id, title).await?;
                if badge_awarded {
                    let notification = badge_notification(user_id, target.id, title);
                    if let Err(e) = self.store.insert_notification(&notification).await {
                        tracing::warn!(user_id, error = %e, "Failed to store badge notification");
                    }
                }
            }
        }

        if all_done && assignment.completed_at.is_none() {
            tracing::info!(
                kind = kind.as_str(),
                assignment_id = assignment.id,
                target_id = target.id,
                badge_awarded,
                "Assignment completed",
            );
        }

        Ok(CompletionResult {
            item,
            progress_pct,
            assignment_completed: completed_at.is_some(),
            badge_awarded,
        })
    }

    async fn current_row(
        &self,
        assignment: &Assignment,
        item_id: DbId,
    ) -> Result<ItemProgress, CoreError> {
        Ok(self
            .store
            .item_progress(assignment.kind, assignment.id)
            .await?
            .into_iter()
            .find(|r| r.item_id == item_id)
            .unwrap_or_else(|| ItemProgress::not_started(assignment.id, item_id)))
    }

    async fn ensure_item(&self, target: &TargetRecord, item_id: DbId) -> Result<(), CoreError> {
        if self
            .store
            .item_ids(target.kind, target.id)
            .await?
            .contains(&item_id)
        {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: target.kind.item_entity(),
                id: item_id,
            })
        }
    }

    /// Learners cannot work on a program their prerequisites still gate.
    async fn ensure_open(
        &self,
        assignment: &Assignment,
        target: &TargetRecord,
    ) -> Result<(), CoreError> {
        match self.prerequisite_state(assignment, target).await? {
            PrerequisiteState::Open => Ok(()),
            PrerequisiteState::Locked { missing } => Err(CoreError::Validation(format!(
                "Program {} is locked until programs {missing:?} are completed",
                target.id
            ))),
            PrerequisiteState::AwaitingApproval => Err(CoreError::Validation(format!(
                "Program {} is waiting for an administrator to unlock it",
                target.id
            ))),
        }
    }
}
