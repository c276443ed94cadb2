//! Assignment engine and progress tracker.
//!
//! [`LearningEngine`] owns the rules that keep department membership,
//! per-user assignments and item progress rows consistent. It talks to
//! storage only through the injected [`LearningStore`].
//!
//! Every multi-step operation is written as a sequence of checked inserts
//! and checked deletes so that re-running it after a partial failure
//! converges on the same end state.

mod assignments;
pub mod memory;
mod progress;
mod status;
pub mod store;

use std::sync::Arc;

use crate::assignment::{AssignmentKind, Recipient};
use crate::error::CoreError;
use crate::identity::Actor;
use crate::types::DbId;

pub use progress::{CompletionResult, ItemOutcome};
pub use status::{AssignmentView, TargetOverview};
pub use store::{
    Assignment, AssignmentStateUpdate, DepartmentRecord, ItemProgress, LearningStore,
    NewAssignment, TargetRecord, UserRecord,
};

#[derive(Clone)]
pub struct LearningEngine {
    store: Arc<dyn LearningStore>,
}

impl LearningEngine {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn LearningStore {
        self.store.as_ref()
    }

    // -----------------------------------------------------------------------
    // Tenant-checked loaders
    // -----------------------------------------------------------------------

    async fn load_target(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<TargetRecord, CoreError> {
        let target = self
            .store
            .find_target(kind, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: kind.target_entity(),
                id,
            })?;
        actor.ensure_same_company(kind.target_entity(), id, target.company_id)?;
        Ok(target)
    }

    async fn load_user(&self, actor: &Actor, id: DbId) -> Result<UserRecord, CoreError> {
        let user = self
            .store
            .find_user(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "user", id })?;
        actor.ensure_same_company("user", id, user.company_id)?;
        Ok(user)
    }

    async fn load_department(&self, actor: &Actor, id: DbId) -> Result<DepartmentRecord, CoreError> {
        let department = self
            .store
            .find_department(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "department",
                id,
            })?;
        actor.ensure_same_company("department", id, department.company_id)?;
        Ok(department)
    }

    async fn load_recipient(&self, actor: &Actor, recipient: Recipient) -> Result<(), CoreError> {
        match recipient {
            Recipient::User(id) => self.load_user(actor, id).await.map(|_| ()),
            Recipient::Department(id) => self.load_department(actor, id).await.map(|_| ()),
        }
    }

    async fn load_assignment(
        &self,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Assignment, CoreError> {
        self.store
            .find_assignment(kind, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "assignment",
                id,
            })
    }

    /// Load an assignment the actor holds personally, with its target.
    async fn load_own_assignment(
        &self,
        actor: &Actor,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<(Assignment, TargetRecord), CoreError> {
        let assignment = self.load_assignment(kind, id).await?;
        if assignment.user_id() != Some(actor.user_id) {
            return Err(CoreError::Forbidden(format!(
                "Assignment {id} does not belong to user {}",
                actor.user_id
            )));
        }
        let target = self.load_target(actor, kind, assignment.target_id).await?;
        Ok((assignment, target))
    }
}
