//! Assignment creation, removal and membership-driven propagation.

use std::collections::HashSet;

use crate::assignment::{
    AssignOptions, AssignOutcome, AssignmentKind, AssignmentSummary, Recipient, RecipientFailure,
};
use crate::error::CoreError;
use crate::identity::Actor;
use crate::notifications::assignment_notification;
use crate::types::DbId;

use super::store::{Assignment, NewAssignment, TargetRecord};
use super::LearningEngine;

impl LearningEngine {
    // -----------------------------------------------------------------------
    // Assign
    // -----------------------------------------------------------------------

    /// Assign a program or checklist directly to one user.
    ///
    /// Assigning twice is not an error: the second call reports
    /// [`AssignOutcome::AlreadyAssigned`] and leaves the existing row alone.
    pub async fn assign_to_user(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        target_id: DbId,
        user_id: DbId,
        options: &AssignOptions,
    ) -> Result<AssignOutcome, CoreError> {
        let target = self.load_target(actor, kind, target_id).await?;
        self.load_user(actor, user_id).await?;
        self.fan_out_user(&target, user_id, options, false).await
    }

    /// Assign a target to a department and every one of its current members.
    pub async fn assign_to_department(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        target_id: DbId,
        department_id: DbId,
        options: &AssignOptions,
    ) -> Result<AssignmentSummary, CoreError> {
        let target = self.load_target(actor, kind, target_id).await?;
        self.load_department(actor, department_id).await?;
        self.fan_out_department(&target, department_id, options).await
    }

    /// Assign a target to a mixed list of users and departments.
    ///
    /// All recipients are checked before anything is written; a missing or
    /// foreign recipient fails the whole request. Failures while writing are
    /// collected into the summary and the remaining recipients still run.
    pub async fn assign(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        target_id: DbId,
        recipients: &[Recipient],
        options: &AssignOptions,
    ) -> Result<AssignmentSummary, CoreError> {
        if recipients.is_empty() {
            return Err(CoreError::Validation(
                "At least one user or department is required".to_string(),
            ));
        }

        let target = self.load_target(actor, kind, target_id).await?;
        for recipient in recipients {
            self.load_recipient(actor, *recipient).await?;
        }

        let mut summary = AssignmentSummary::default();
        for recipient in recipients {
            let result = match *recipient {
                Recipient::User(user_id) => self
                    .fan_out_user(&target, user_id, options, false)
                    .await
                    .map(|outcome| summary.record(outcome)),
                Recipient::Department(department_id) => self
                    .fan_out_department(&target, department_id, options)
                    .await
                    .map(|dept_summary| summary.merge(dept_summary)),
            };
            if let Err(e) = result {
                tracing::warn!(
                    kind = kind.as_str(),
                    target_id,
                    %recipient,
                    error = %e,
                    "Assignment failed for recipient",
                );
                summary.failed.push(RecipientFailure {
                    recipient: *recipient,
                    error: e.to_string(),
                });
            }
        }

        tracing::info!(
            kind = kind.as_str(),
            target_id,
            assigned = summary.assigned,
            already_assigned = summary.already_assigned,
            failed = summary.failed.len(),
            "Assignment request processed",
        );
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Unassign
    // -----------------------------------------------------------------------

    /// Remove an assignment. Returns how many user assignments were deleted.
    ///
    /// Removing a department drops every member row it no longer justifies.
    /// Removing a user row that a department still justifies is refused,
    /// whether it was assigned directly or through the department.
    /// Unassigning something that is not assigned is a no-op.
    pub async fn unassign(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        target_id: DbId,
        recipient: Recipient,
    ) -> Result<usize, CoreError> {
        self.load_target(actor, kind, target_id).await?;
        self.load_recipient(actor, recipient).await?;

        match recipient {
            Recipient::Department(_) => {
                if let Some(row) = self
                    .store
                    .find_assignment_for(kind, target_id, recipient)
                    .await?
                {
                    self.store.delete_assignment(kind, row.id).await?;
                }
                let removed = self.prune_unjustified(kind, target_id).await?;
                tracing::info!(
                    kind = kind.as_str(),
                    target_id,
                    %recipient,
                    removed,
                    "Department unassigned",
                );
                Ok(removed)
            }
            Recipient::User(user_id) => {
                let Some(row) = self
                    .store
                    .find_assignment_for(kind, target_id, recipient)
                    .await?
                else {
                    return Ok(0);
                };
                if self.is_justified(kind, target_id, user_id).await? {
                    return Err(CoreError::Validation(format!(
                        "User {user_id} receives this {} through a department; unassign the department instead",
                        kind.as_str()
                    )));
                }
                self.remove_user_assignment(&row).await?;
                tracing::info!(kind = kind.as_str(), target_id, user_id, "User unassigned");
                Ok(1)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Membership hooks
    // -----------------------------------------------------------------------

    /// Add a user to a department and hand them every target the
    /// department is assigned.
    pub async fn on_user_joins_department(
        &self,
        actor: &Actor,
        department_id: DbId,
        user_id: DbId,
    ) -> Result<AssignmentSummary, CoreError> {
        self.load_department(actor, department_id).await?;
        self.load_user(actor, user_id).await?;

        self.store.add_member(department_id, user_id).await?;

        let mut summary = AssignmentSummary::default();
        for dept_row in self.store.department_assignments(department_id).await? {
            let Some(target) = self
                .store
                .find_target(dept_row.kind, dept_row.target_id)
                .await?
            else {
                continue;
            };
            let options = AssignOptions {
                due_date: dept_row.due_date,
                assigned_by: dept_row.assigned_by,
            };
            match self.fan_out_user(&target, user_id, &options, true).await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => summary.failed.push(RecipientFailure {
                    recipient: Recipient::User(user_id),
                    error: format!("{} {}: {e}", target.kind.as_str(), target.id),
                }),
            }
        }

        tracing::info!(
            department_id,
            user_id,
            assigned = summary.assigned,
            "User joined department",
        );
        Ok(summary)
    }

    /// Remove a user from a department and drop the auto-assignments no
    /// other department of theirs still justifies. Returns how many
    /// assignments were deleted.
    pub async fn on_user_leaves_department(
        &self,
        actor: &Actor,
        department_id: DbId,
        user_id: DbId,
    ) -> Result<usize, CoreError> {
        self.load_department(actor, department_id).await?;
        self.load_user(actor, user_id).await?;

        self.store.remove_member(department_id, user_id).await?;

        let mut removed = 0;
        for row in self.store.user_assignments(user_id).await? {
            if !row.is_auto_assigned {
                continue;
            }
            if !self.is_justified(row.kind, row.target_id, user_id).await? {
                self.remove_user_assignment(&row).await?;
                removed += 1;
            }
        }

        tracing::info!(department_id, user_id, removed, "User left department");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Catalog hooks
    // -----------------------------------------------------------------------

    /// Give every open assignment of a target a row for a newly added item.
    /// Completed assignments are left as they are.
    pub async fn backfill_item(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        target_id: DbId,
        item_id: DbId,
    ) -> Result<u64, CoreError> {
        self.load_target(actor, kind, target_id).await?;
        if !self.store.item_ids(kind, target_id).await?.contains(&item_id) {
            return Err(CoreError::NotFound {
                entity: kind.item_entity(),
                id: item_id,
            });
        }

        let mut created = 0;
        for row in self.store.user_assignments_for_target(kind, target_id).await? {
            if row.completed_at.is_some() {
                continue;
            }
            created += self
                .store
                .insert_item_progress(kind, row.id, &[item_id])
                .await?;
        }
        tracing::debug!(kind = kind.as_str(), target_id, item_id, created, "Backfilled item rows");
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Create (or resume) one user's assignment to `target`.
    ///
    /// Item rows are written only after the assignment row exists. An
    /// existing assignment gets any missing item rows re-created, so a
    /// fan-out interrupted between the two steps heals on retry.
    async fn fan_out_user(
        &self,
        target: &TargetRecord,
        user_id: DbId,
        options: &AssignOptions,
        auto: bool,
    ) -> Result<AssignOutcome, CoreError> {
        let recipient = Recipient::User(user_id);

        if let Some(existing) = self
            .store
            .find_assignment_for(target.kind, target.id, recipient)
            .await?
        {
            self.ensure_item_rows(&existing).await?;
            return Ok(AssignOutcome::AlreadyAssigned(existing.id));
        }

        let new = NewAssignment {
            kind: target.kind,
            target_id: target.id,
            recipient,
            assigned_by: options.assigned_by,
            due_date: options.due_date,
            is_auto_assigned: auto,
        };

        let Some(created) = self.store.insert_assignment(&new).await? else {
            // Lost the race against a concurrent insert of the same pair.
            let existing = self
                .store
                .find_assignment_for(target.kind, target.id, recipient)
                .await?
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "Assignment for {recipient} vanished after a conflicting insert"
                    ))
                })?;
            self.ensure_item_rows(&existing).await?;
            return Ok(AssignOutcome::AlreadyAssigned(existing.id));
        };

        let items = self.store.item_ids(target.kind, target.id).await?;
        self.store
            .insert_item_progress(target.kind, created.id, &items)
            .await?;

        let notification = assignment_notification(user_id, target.kind, target.id, &target.title);
        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::warn!(user_id, error = %e, "Failed to store assignment notification");
        }

        tracing::debug!(
            kind = target.kind.as_str(),
            target_id = target.id,
            user_id,
            auto,
            items = items.len(),
            "User assignment created",
        );
        Ok(AssignOutcome::Assigned(created.id))
    }

    async fn fan_out_department(
        &self,
        target: &TargetRecord,
        department_id: DbId,
        options: &AssignOptions,
    ) -> Result<AssignmentSummary, CoreError> {
        let recipient = Recipient::Department(department_id);
        if self
            .store
            .find_assignment_for(target.kind, target.id, recipient)
            .await?
            .is_none()
        {
            let new = NewAssignment {
                kind: target.kind,
                target_id: target.id,
                recipient,
                assigned_by: options.assigned_by,
                due_date: options.due_date,
                is_auto_assigned: false,
            };
            self.store.insert_assignment(&new).await?;
        }

        let mut summary = AssignmentSummary::default();
        for user_id in self.store.department_member_ids(department_id).await? {
            match self.fan_out_user(target, user_id, options, true).await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => summary.failed.push(RecipientFailure {
                    recipient: Recipient::User(user_id),
                    error: e.to_string(),
                }),
            }
        }
        Ok(summary)
    }

    async fn ensure_item_rows(&self, assignment: &Assignment) -> Result<(), CoreError> {
        if assignment.completed_at.is_some() {
            return Ok(());
        }
        let have: HashSet<DbId> = self
            .store
            .item_progress(assignment.kind, assignment.id)
            .await?
            .into_iter()
            .map(|p| p.item_id)
            .collect();
        let missing: Vec<DbId> = self
            .store
            .item_ids(assignment.kind, assignment.target_id)
            .await?
            .into_iter()
            .filter(|id| !have.contains(id))
            .collect();
        if !missing.is_empty() {
            self.store
                .insert_item_progress(assignment.kind, assignment.id, &missing)
                .await?;
        }
        Ok(())
    }

    /// Whether any department the user belongs to still holds an assignment
    /// to the target.
    async fn is_justified(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
        user_id: DbId,
    ) -> Result<bool, CoreError> {
        let assigned: HashSet<DbId> = self
            .store
            .department_assignments_for_target(kind, target_id)
            .await?
            .iter()
            .filter_map(|row| row.recipient.department_id())
            .collect();
        if assigned.is_empty() {
            return Ok(false);
        }
        Ok(self
            .store
            .user_department_ids(user_id)
            .await?
            .iter()
            .any(|d| assigned.contains(d)))
    }

    async fn prune_unjustified(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<usize, CoreError> {
        let mut removed = 0;
        for row in self.store.user_assignments_for_target(kind, target_id).await? {
            let Some(user_id) = row.user_id() else {
                continue;
            };
            if row.is_auto_assigned && !self.is_justified(kind, target_id, user_id).await? {
                self.remove_user_assignment(&row).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Children first, then the assignment itself.
    async fn remove_user_assignment(&self, row: &Assignment) -> Result<(), CoreError> {
        self.store.delete_item_progress(row.kind, row.id).await?;
        self.store.delete_assignment(row.kind, row.id).await?;
        Ok(())
    }
}
