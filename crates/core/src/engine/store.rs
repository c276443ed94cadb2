//! The persistence seam of the learning engine.
//!
//! [`LearningStore`] is everything the engine reads and writes. The
//! production implementation lives in `trainhub-db`; [`super::memory`]
//! provides an in-memory one for tests.
//!
//! Uniqueness of assignments and item rows is the store's job: inserts that
//! hit an existing `(target, recipient)` or `(assignment, item)` pair must
//! report "nothing inserted" instead of failing.

use async_trait::async_trait;
use serde::Serialize;

use crate::assignment::{AssignmentKind, AssignmentState, ItemStatus, Recipient};
use crate::error::CoreError;
use crate::module_content::ModuleContent;
use crate::notifications::NewNotification;
use crate::prerequisites::ProgramGate;
use crate::quiz::QuizOutcome;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: DbId,
    pub company_id: DbId,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentRecord {
    pub id: DbId,
    pub company_id: DbId,
    pub name: String,
}

/// A program or checklist as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub kind: AssignmentKind,
    pub id: DbId,
    pub company_id: DbId,
    pub title: String,
    pub passing_score: i16,
    /// Set when the program awards a badge on completion.
    pub badge_title: Option<String>,
    /// Present for programs only.
    pub gate: Option<ProgramGate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub id: DbId,
    pub kind: AssignmentKind,
    pub target_id: DbId,
    pub recipient: Recipient,
    pub status: AssignmentState,
    pub assigned_by: Option<DbId>,
    pub assigned_at: Timestamp,
    pub due_date: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub progress_pct: i16,
    pub is_auto_assigned: bool,
}

impl Assignment {
    pub fn user_id(&self) -> Option<DbId> {
        self.recipient.user_id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub kind: AssignmentKind,
    pub target_id: DbId,
    pub recipient: Recipient,
    pub assigned_by: Option<DbId>,
    pub due_date: Option<Timestamp>,
    pub is_auto_assigned: bool,
}

/// Columns rewritten when progress or gating changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentStateUpdate {
    pub status: AssignmentState,
    pub progress_pct: i16,
    pub completed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemProgress {
    pub assignment_id: DbId,
    pub item_id: DbId,
    pub status: ItemStatus,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub time_spent_secs: i64,
    pub quiz: Option<QuizOutcome>,
}

impl ItemProgress {
    pub fn not_started(assignment_id: DbId, item_id: DbId) -> Self {
        Self {
            assignment_id,
            item_id,
            status: ItemStatus::NotStarted,
            started_at: None,
            completed_at: None,
            time_spent_secs: 0,
            quiz: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[async_trait]
pub trait LearningStore: Send + Sync {
    // -- membership --------------------------------------------------------

    async fn find_user(&self, id: DbId) -> Result<Option<UserRecord>, CoreError>;

    async fn find_department(&self, id: DbId) -> Result<Option<DepartmentRecord>, CoreError>;

    async fn department_member_ids(&self, department_id: DbId) -> Result<Vec<DbId>, CoreError>;

    async fn user_department_ids(&self, user_id: DbId) -> Result<Vec<DbId>, CoreError>;

    /// Returns `false` when the user was already a member.
    async fn add_member(&self, department_id: DbId, user_id: DbId) -> Result<bool, CoreError>;

    /// Returns `false` when the user was not a member.
    async fn remove_member(&self, department_id: DbId, user_id: DbId) -> Result<bool, CoreError>;

    // -- catalog -----------------------------------------------------------

    async fn find_target(
        &self,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Option<TargetRecord>, CoreError>;

    /// Item ids of a target in `order_index` order.
    async fn item_ids(&self, kind: AssignmentKind, target_id: DbId) -> Result<Vec<DbId>, CoreError>;

    async fn find_module_content(
        &self,
        program_id: DbId,
        module_id: DbId,
    ) -> Result<Option<ModuleContent>, CoreError>;

    /// Every program of a company, for prerequisite evaluation.
    async fn program_gates(&self, company_id: DbId) -> Result<Vec<ProgramGate>, CoreError>;

    // -- assignments -------------------------------------------------------

    async fn find_assignment(
        &self,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Option<Assignment>, CoreError>;

    async fn find_assignment_for(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
        recipient: Recipient,
    ) -> Result<Option<Assignment>, CoreError>;

    /// Insert unless the `(target, recipient)` pair already exists, in which
    /// case `None` is returned.
    async fn insert_assignment(&self, new: &NewAssignment) -> Result<Option<Assignment>, CoreError>;

    async fn delete_assignment(&self, kind: AssignmentKind, id: DbId) -> Result<bool, CoreError>;

    async fn update_assignment_state(
        &self,
        kind: AssignmentKind,
        id: DbId,
        update: &AssignmentStateUpdate,
    ) -> Result<(), CoreError>;

    /// Department rows of both kinds held by one department.
    async fn department_assignments(&self, department_id: DbId) -> Result<Vec<Assignment>, CoreError>;

    /// Department rows pointing at one target.
    async fn department_assignments_for_target(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<Assignment>, CoreError>;

    /// User rows pointing at one target.
    async fn user_assignments_for_target(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<Assignment>, CoreError>;

    /// User rows of both kinds held by one user.
    async fn user_assignments(&self, user_id: DbId) -> Result<Vec<Assignment>, CoreError>;

    // -- item progress -----------------------------------------------------

    /// Insert `not_started` rows, skipping items that already have one.
    /// Returns the number of rows created.
    async fn insert_item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
        item_ids: &[DbId],
    ) -> Result<u64, CoreError>;

    async fn item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<Vec<ItemProgress>, CoreError>;

    /// Upsert one row keyed by `(assignment_id, item_id)`.
    async fn save_item_progress(
        &self,
        kind: AssignmentKind,
        progress: &ItemProgress,
    ) -> Result<(), CoreError>;

    async fn delete_item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<u64, CoreError>;

    // -- rewards and notifications -----------------------------------------

    /// Returns `false` when the user already holds the badge.
    async fn award_badge(
        &self,
        user_id: DbId,
        program_id: DbId,
        title: &str,
    ) -> Result<bool, CoreError>;

    async fn insert_notification(&self, notification: &NewNotification) -> Result<(), CoreError>;
}
