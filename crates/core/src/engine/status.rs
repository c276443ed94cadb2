//! Status views shared by the learner dashboard and admin overviews,
//! plus the admin unlock of manually gated programs.

use std::collections::HashSet;

use serde::Serialize;

use crate::assignment::{AssignmentKind, AssignmentState, ItemStatus};
use crate::derived_status::{resolve, DerivedStatus};
use crate::error::CoreError;
use crate::identity::Actor;
use crate::prerequisites::{evaluate, PrerequisiteState};
use crate::roles::can_manage_catalog;
use crate::types::{DbId, Timestamp};

use super::store::{Assignment, AssignmentStateUpdate, TargetRecord};
use super::LearningEngine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentView {
    pub assignment: Assignment,
    pub title: String,
    pub status: DerivedStatus,
    pub gate: PrerequisiteState,
    pub completed_items: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOverview {
    pub departments: Vec<Assignment>,
    pub users: Vec<AssignmentView>,
}

impl LearningEngine {
    /// Resolve one assignment. Visible to its learner and to catalog
    /// managers of the same company.
    pub async fn resolve_assignment(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        assignment_id: DbId,
        now: Timestamp,
    ) -> Result<AssignmentView, CoreError> {
        let assignment = self.load_assignment(kind, assignment_id).await?;
        let target = self.load_target(actor, kind, assignment.target_id).await?;
        if assignment.user_id() != Some(actor.user_id) && !can_manage_catalog(&actor.role) {
            return Err(CoreError::Forbidden(format!(
                "Assignment {assignment_id} does not belong to user {}",
                actor.user_id
            )));
        }
        self.view(assignment, &target, now).await
    }

    /// Everything assigned to the calling user, with derived statuses.
    pub async fn learner_overview(
        &self,
        actor: &Actor,
        now: Timestamp,
    ) -> Result<Vec<AssignmentView>, CoreError> {
        let mut views = Vec::new();
        for assignment in self.store.user_assignments(actor.user_id).await? {
            let Some(target) = self
                .store
                .find_target(assignment.kind, assignment.target_id)
                .await?
            else {
                continue;
            };
            if target.company_id != actor.company_id {
                continue;
            }
            views.push(self.view(assignment, &target, now).await?);
        }
        Ok(views)
    }

    /// Who holds a target and where each learner stands.
    pub async fn target_overview(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        target_id: DbId,
        now: Timestamp,
    ) -> Result<TargetOverview, CoreError> {
        let target = self.load_target(actor, kind, target_id).await?;
        let departments = self
            .store
            .department_assignments_for_target(kind, target_id)
            .await?;
        let mut users = Vec::new();
        for assignment in self.store.user_assignments_for_target(kind, target_id).await? {
            users.push(self.view(assignment, &target, now).await?);
        }
        Ok(TargetOverview { departments, users })
    }

    /// Release a manually gated program assignment.
    ///
    /// Only the stored status changes; the prerequisite graph is untouched.
    /// Unlocking an assignment that is already released is a no-op.
    pub async fn unlock(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<Assignment, CoreError> {
        if kind != AssignmentKind::Program {
            return Err(CoreError::Validation(
                "Only program assignments can be unlocked".to_string(),
            ));
        }
        let mut assignment = self.load_assignment(kind, assignment_id).await?;
        self.load_target(actor, kind, assignment.target_id).await?;
        if assignment.user_id().is_none() {
            return Err(CoreError::Validation(
                "Department assignments cannot be unlocked; unlock the member assignments"
                    .to_string(),
            ));
        }

        if assignment.status == AssignmentState::Assigned {
            let update = AssignmentStateUpdate {
                status: AssignmentState::Available,
                progress_pct: assignment.progress_pct,
                completed_at: assignment.completed_at,
            };
            self.store
                .update_assignment_state(kind, assignment.id, &update)
                .await?;
            assignment.status = AssignmentState::Available;
            tracing::info!(assignment_id, unlocked_by = actor.user_id, "Assignment unlocked");
        }
        Ok(assignment)
    }

    /// Evaluate prerequisite gating for one user assignment.
    pub(crate) async fn prerequisite_state(
        &self,
        assignment: &Assignment,
        target: &TargetRecord,
    ) -> Result<PrerequisiteState, CoreError> {
        let (Some(gate), Some(user_id)) = (&target.gate, assignment.user_id()) else {
            return Ok(PrerequisiteState::Open);
        };
        if assignment.kind != AssignmentKind::Program {
            return Ok(PrerequisiteState::Open);
        }

        let mut assigned = HashSet::new();
        let mut completed = HashSet::new();
        for row in self.store.user_assignments(user_id).await? {
            if row.kind != AssignmentKind::Program {
                continue;
            }
            assigned.insert(row.target_id);
            if row.completed_at.is_some() {
                completed.insert(row.target_id);
            }
        }

        let catalog = self.store.program_gates(target.company_id).await?;
        Ok(evaluate(
            gate,
            &catalog,
            &assigned,
            &completed,
            assignment.status.is_released(),
        ))
    }

    async fn view(
        &self,
        assignment: Assignment,
        target: &TargetRecord,
        now: Timestamp,
    ) -> Result<AssignmentView, CoreError> {
        let items: Vec<ItemStatus> = self
            .store
            .item_progress(assignment.kind, assignment.id)
            .await?
            .into_iter()
            .map(|row| row.status)
            .collect();
        let gate = self.prerequisite_state(&assignment, target).await?;
        let status = resolve(
            assignment.completed_at,
            assignment.due_date,
            &items,
            &gate,
            now,
        );
        Ok(AssignmentView {
            completed_items: items
                .iter()
                .filter(|s| **s == ItemStatus::Completed)
                .count(),
            total_items: items.len(),
            title: target.title.clone(),
            status,
            gate,
            assignment,
        })
    }
}
