//! In-memory [`LearningStore`] used by engine tests.
//!
//! Enforces the same uniqueness rules as the Postgres schema. Seeding and
//! inspection helpers live on [`InMemoryStore`] itself.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::assignment::{AssignmentKind, AssignmentState, Recipient};
use crate::error::CoreError;
use crate::module_content::ModuleContent;
use crate::notifications::NewNotification;
use crate::prerequisites::{PrerequisiteType, ProgramGate};
use crate::quiz::DEFAULT_PASSING_SCORE;
use crate::types::DbId;

use super::store::{
    Assignment, AssignmentStateUpdate, DepartmentRecord, ItemProgress, LearningStore,
    NewAssignment, TargetRecord, UserRecord,
};

#[derive(Default)]
struct State {
    next_id: DbId,
    users: HashMap<DbId, UserRecord>,
    departments: HashMap<DbId, DepartmentRecord>,
    memberships: HashSet<(DbId, DbId)>,
    targets: HashMap<(AssignmentKind, DbId), TargetRecord>,
    /// Items per target, kept in insertion order.
    items: HashMap<(AssignmentKind, DbId), Vec<(DbId, Option<ModuleContent>)>>,
    assignments: BTreeMap<(AssignmentKind, DbId), Assignment>,
    progress: BTreeMap<(AssignmentKind, DbId, DbId), ItemProgress>,
    badges: HashSet<(DbId, DbId)>,
    notifications: Vec<NewNotification>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub fn add_user(&self, company_id: DbId, role: &str) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state.users.insert(
            id,
            UserRecord {
                id,
                company_id,
                role: role.to_string(),
            },
        );
        id
    }

    pub fn add_department(&self, company_id: DbId, name: &str) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state.departments.insert(
            id,
            DepartmentRecord {
                id,
                company_id,
                name: name.to_string(),
            },
        );
        id
    }

    /// Add a membership without going through the engine hooks.
    pub fn add_membership(&self, department_id: DbId, user_id: DbId) {
        self.lock().memberships.insert((user_id, department_id));
    }

    /// A program with no prerequisites, no theme and no badge.
    pub fn add_program(&self, company_id: DbId, title: &str) -> DbId {
        self.add_gated_program(company_id, title, None, 0, PrerequisiteType::None, &[])
    }

    pub fn add_gated_program(
        &self,
        company_id: DbId,
        title: &str,
        theme_id: Option<DbId>,
        order_index: i32,
        prerequisite_type: PrerequisiteType,
        prerequisite_course_ids: &[DbId],
    ) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state.targets.insert(
            (AssignmentKind::Program, id),
            TargetRecord {
                kind: AssignmentKind::Program,
                id,
                company_id,
                title: title.to_string(),
                passing_score: DEFAULT_PASSING_SCORE,
                badge_title: None,
                gate: Some(ProgramGate {
                    id,
                    theme_id,
                    order_index,
                    prerequisite_type,
                    prerequisite_course_ids: prerequisite_course_ids.to_vec(),
                }),
            },
        );
        id
    }

    pub fn enable_badge(&self, program_id: DbId, title: &str) {
        if let Some(target) = self
            .lock()
            .targets
            .get_mut(&(AssignmentKind::Program, program_id))
        {
            target.badge_title = Some(title.to_string());
        }
    }

    pub fn add_checklist(&self, company_id: DbId, title: &str) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state.targets.insert(
            (AssignmentKind::Checklist, id),
            TargetRecord {
                kind: AssignmentKind::Checklist,
                id,
                company_id,
                title: title.to_string(),
                passing_score: DEFAULT_PASSING_SCORE,
                badge_title: None,
                gate: None,
            },
        );
        id
    }

    /// Append an item (module or checklist item) to a target.
    pub fn add_item(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
        content: Option<ModuleContent>,
    ) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state
            .items
            .entry((kind, target_id))
            .or_default()
            .push((id, content));
        id
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn assignments(&self) -> Vec<Assignment> {
        self.lock().assignments.values().cloned().collect()
    }

    pub fn user_rows(&self, kind: AssignmentKind, target_id: DbId) -> Vec<Assignment> {
        self.lock()
            .assignments
            .values()
            .filter(|a| a.kind == kind && a.target_id == target_id && a.user_id().is_some())
            .cloned()
            .collect()
    }

    pub fn progress_rows(&self) -> Vec<ItemProgress> {
        self.lock().progress.values().cloned().collect()
    }

    pub fn notifications(&self) -> Vec<NewNotification> {
        self.lock().notifications.clone()
    }

    pub fn badge_count(&self) -> usize {
        self.lock().badges.len()
    }
}

#[async_trait]
impl LearningStore for InMemoryStore {
    async fn find_user(&self, id: DbId) -> Result<Option<UserRecord>, CoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_department(&self, id: DbId) -> Result<Option<DepartmentRecord>, CoreError> {
        Ok(self.lock().departments.get(&id).cloned())
    }

    async fn department_member_ids(&self, department_id: DbId) -> Result<Vec<DbId>, CoreError> {
        let mut ids: Vec<DbId> = self
            .lock()
            .memberships
            .iter()
            .filter(|(_, d)| *d == department_id)
            .map(|(u, _)| *u)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn user_department_ids(&self, user_id: DbId) -> Result<Vec<DbId>, CoreError> {
        let mut ids: Vec<DbId> = self
            .lock()
            .memberships
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, d)| *d)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn add_member(&self, department_id: DbId, user_id: DbId) -> Result<bool, CoreError> {
        Ok(self.lock().memberships.insert((user_id, department_id)))
    }

    async fn remove_member(&self, department_id: DbId, user_id: DbId) -> Result<bool, CoreError> {
        Ok(self.lock().memberships.remove(&(user_id, department_id)))
    }

    async fn find_target(
        &self,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Option<TargetRecord>, CoreError> {
        Ok(self.lock().targets.get(&(kind, id)).cloned())
    }

    async fn item_ids(&self, kind: AssignmentKind, target_id: DbId) -> Result<Vec<DbId>, CoreError> {
        Ok(self
            .lock()
            .items
            .get(&(kind, target_id))
            .map(|items| items.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default())
    }

    async fn find_module_content(
        &self,
        program_id: DbId,
        module_id: DbId,
    ) -> Result<Option<ModuleContent>, CoreError> {
        Ok(self
            .lock()
            .items
            .get(&(AssignmentKind::Program, program_id))
            .and_then(|items| items.iter().find(|(id, _)| *id == module_id))
            .and_then(|(_, content)| content.clone()))
    }

    async fn program_gates(&self, company_id: DbId) -> Result<Vec<ProgramGate>, CoreError> {
        Ok(self
            .lock()
            .targets
            .values()
            .filter(|t| t.company_id == company_id)
            .filter_map(|t| t.gate.clone())
            .collect())
    }

    async fn find_assignment(
        &self,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Option<Assignment>, CoreError> {
        Ok(self.lock().assignments.get(&(kind, id)).cloned())
    }

    async fn find_assignment_for(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
        recipient: Recipient,
    ) -> Result<Option<Assignment>, CoreError> {
        Ok(self
            .lock()
            .assignments
            .values()
            .find(|a| a.kind == kind && a.target_id == target_id && a.recipient == recipient)
            .cloned())
    }

    async fn insert_assignment(&self, new: &NewAssignment) -> Result<Option<Assignment>, CoreError> {
        let mut state = self.lock();
        let duplicate = state.assignments.values().any(|a| {
            a.kind == new.kind && a.target_id == new.target_id && a.recipient == new.recipient
        });
        if duplicate {
            return Ok(None);
        }
        let id = state.next_id();
        let assignment = Assignment {
            id,
            kind: new.kind,
            target_id: new.target_id,
            recipient: new.recipient,
            status: AssignmentState::Assigned,
            assigned_by: new.assigned_by,
            assigned_at: Utc::now(),
            due_date: new.due_date,
            completed_at: None,
            progress_pct: 0,
            is_auto_assigned: new.is_auto_assigned,
        };
        state.assignments.insert((new.kind, id), assignment.clone());
        Ok(Some(assignment))
    }

    async fn delete_assignment(&self, kind: AssignmentKind, id: DbId) -> Result<bool, CoreError> {
        let mut state = self.lock();
        let has_children = state
            .progress
            .keys()
            .any(|(k, assignment_id, _)| *k == kind && *assignment_id == id);
        if has_children {
            return Err(CoreError::Internal(format!(
                "Assignment {id} still has item progress rows"
            )));
        }
        Ok(state.assignments.remove(&(kind, id)).is_some())
    }

    async fn update_assignment_state(
        &self,
        kind: AssignmentKind,
        id: DbId,
        update: &AssignmentStateUpdate,
    ) -> Result<(), CoreError> {
        if let Some(a) = self.lock().assignments.get_mut(&(kind, id)) {
            a.status = update.status;
            a.progress_pct = update.progress_pct;
            a.completed_at = update.completed_at;
        }
        Ok(())
    }

    async fn department_assignments(&self, department_id: DbId) -> Result<Vec<Assignment>, CoreError> {
        Ok(self
            .lock()
            .assignments
            .values()
            .filter(|a| a.recipient == Recipient::Department(department_id))
            .cloned()
            .collect())
    }

    async fn department_assignments_for_target(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<Assignment>, CoreError> {
        Ok(self
            .lock()
            .assignments
            .values()
            .filter(|a| {
                a.kind == kind && a.target_id == target_id && a.recipient.department_id().is_some()
            })
            .cloned()
            .collect())
    }

    async fn user_assignments_for_target(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<Assignment>, CoreError> {
        Ok(self.user_rows(kind, target_id))
    }

    async fn user_assignments(&self, user_id: DbId) -> Result<Vec<Assignment>, CoreError> {
        Ok(self
            .lock()
            .assignments
            .values()
            .filter(|a| a.recipient == Recipient::User(user_id))
            .cloned()
            .collect())
    }

    async fn insert_item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
        item_ids: &[DbId],
    ) -> Result<u64, CoreError> {
        let mut state = self.lock();
        if !state.assignments.contains_key(&(kind, assignment_id)) {
            return Err(CoreError::Internal(format!(
                "Assignment {assignment_id} does not exist"
            )));
        }
        let mut created = 0;
        for &item_id in item_ids {
            let key = (kind, assignment_id, item_id);
            if !state.progress.contains_key(&key) {
                state
                    .progress
                    .insert(key, ItemProgress::not_started(assignment_id, item_id));
                created += 1;
            }
        }
        Ok(created)
    }

    async fn item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<Vec<ItemProgress>, CoreError> {
        Ok(self
            .lock()
            .progress
            .iter()
            .filter(|((k, a, _), _)| *k == kind && *a == assignment_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn save_item_progress(
        &self,
        kind: AssignmentKind,
        progress: &ItemProgress,
    ) -> Result<(), CoreError> {
        self.lock().progress.insert(
            (kind, progress.assignment_id, progress.item_id),
            progress.clone(),
        );
        Ok(())
    }

    async fn delete_item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<u64, CoreError> {
        let mut state = self.lock();
        let before = state.progress.len();
        state
            .progress
            .retain(|(k, a, _), _| !(*k == kind && *a == assignment_id));
        Ok((before - state.progress.len()) as u64)
    }

    async fn award_badge(
        &self,
        user_id: DbId,
        program_id: DbId,
        _title: &str,
    ) -> Result<bool, CoreError> {
        Ok(self.lock().badges.insert((user_id, program_id)))
    }

    async fn insert_notification(&self, notification: &NewNotification) -> Result<(), CoreError> {
        self.lock().notifications.push(notification.clone());
        Ok(())
    }
}
