//! PostgreSQL implementation of the engine's [`LearningStore`].

use async_trait::async_trait;
use sqlx::PgPool;
use trainhub_core::assignment::{AssignmentKind, Recipient};
use trainhub_core::engine::{
    Assignment, AssignmentStateUpdate, DepartmentRecord, ItemProgress, LearningStore,
    NewAssignment, TargetRecord, UserRecord,
};
use trainhub_core::error::CoreError;
use trainhub_core::module_content::ModuleContent;
use trainhub_core::notifications::NewNotification;
use trainhub_core::prerequisites::ProgramGate;
use trainhub_core::types::DbId;

use crate::models::assignment::{AssignmentRow, ItemProgressRow};
use crate::models::checklist::Checklist;
use crate::repositories::{
    AssignmentRepo, BadgeRepo, ChecklistRepo, DepartmentRepo, ItemProgressRepo, NotificationRepo,
    ProgramRepo, ReminderRepo, UserRepo,
};

/// Engine storage backed by the shared connection pool.
#[derive(Clone)]
pub struct PgLearningStore {
    pool: PgPool,
}

impl PgLearningStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("Database error: {e}"))
}

fn corrupt(e: String) -> CoreError {
    CoreError::Internal(format!("Corrupt row: {e}"))
}

fn into_assignments(
    kind: AssignmentKind,
    rows: Vec<AssignmentRow>,
) -> Result<Vec<Assignment>, CoreError> {
    rows.into_iter()
        .map(|row| row.into_assignment(kind).map_err(corrupt))
        .collect()
}

fn into_progress(rows: Vec<ItemProgressRow>) -> Result<Vec<ItemProgress>, CoreError> {
    rows.into_iter()
        .map(|row| row.into_progress().map_err(corrupt))
        .collect()
}

const KINDS: [AssignmentKind; 2] = [AssignmentKind::Program, AssignmentKind::Checklist];

#[async_trait]
impl LearningStore for PgLearningStore {
    // -- membership --------------------------------------------------------

    async fn find_user(&self, id: DbId) -> Result<Option<UserRecord>, CoreError> {
        let user = UserRepo::find_by_id(&self.pool, id).await.map_err(db_err)?;
        Ok(user.map(UserRecord::from))
    }

    async fn find_department(&self, id: DbId) -> Result<Option<DepartmentRecord>, CoreError> {
        let department = DepartmentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_err)?;
        Ok(department.map(DepartmentRecord::from))
    }

    async fn department_member_ids(&self, department_id: DbId) -> Result<Vec<DbId>, CoreError> {
        DepartmentRepo::member_ids(&self.pool, department_id)
            .await
            .map_err(db_err)
    }

    async fn user_department_ids(&self, user_id: DbId) -> Result<Vec<DbId>, CoreError> {
        DepartmentRepo::department_ids_for_user(&self.pool, user_id)
            .await
            .map_err(db_err)
    }

    async fn add_member(&self, department_id: DbId, user_id: DbId) -> Result<bool, CoreError> {
        DepartmentRepo::add_member(&self.pool, department_id, user_id)
            .await
            .map_err(db_err)
    }

    async fn remove_member(&self, department_id: DbId, user_id: DbId) -> Result<bool, CoreError> {
        DepartmentRepo::remove_member(&self.pool, department_id, user_id)
            .await
            .map_err(db_err)
    }

    // -- catalog -----------------------------------------------------------

    async fn find_target(
        &self,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Option<TargetRecord>, CoreError> {
        match kind {
            AssignmentKind::Program => {
                let program = ProgramRepo::find_by_id(&self.pool, id)
                    .await
                    .map_err(db_err)?;
                program
                    .map(|p| p.into_target().map_err(corrupt))
                    .transpose()
            }
            AssignmentKind::Checklist => {
                let checklist = ChecklistRepo::find_by_id(&self.pool, id)
                    .await
                    .map_err(db_err)?;
                Ok(checklist.map(|c: Checklist| c.into()))
            }
        }
    }

    async fn item_ids(&self, kind: AssignmentKind, target_id: DbId) -> Result<Vec<DbId>, CoreError> {
        match kind {
            AssignmentKind::Program => ProgramRepo::module_ids(&self.pool, target_id).await,
            AssignmentKind::Checklist => ChecklistRepo::item_ids(&self.pool, target_id).await,
        }
        .map_err(db_err)
    }

    async fn find_module_content(
        &self,
        program_id: DbId,
        module_id: DbId,
    ) -> Result<Option<ModuleContent>, CoreError> {
        let module = ProgramRepo::find_module(&self.pool, program_id, module_id)
            .await
            .map_err(db_err)?;
        Ok(module.map(|m| m.content.0))
    }

    async fn program_gates(&self, company_id: DbId) -> Result<Vec<ProgramGate>, CoreError> {
        ProgramRepo::list_for_company(&self.pool, company_id)
            .await
            .map_err(db_err)?
            .iter()
            .map(|p| p.gate().map_err(corrupt))
            .collect()
    }

    // -- assignments -------------------------------------------------------

    async fn find_assignment(
        &self,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Option<Assignment>, CoreError> {
        AssignmentRepo::find_by_id(&self.pool, kind, id)
            .await
            .map_err(db_err)?
            .map(|row| row.into_assignment(kind).map_err(corrupt))
            .transpose()
    }

    async fn find_assignment_for(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
        recipient: Recipient,
    ) -> Result<Option<Assignment>, CoreError> {
        AssignmentRepo::find_for_recipient(&self.pool, kind, target_id, recipient)
            .await
            .map_err(db_err)?
            .map(|row| row.into_assignment(kind).map_err(corrupt))
            .transpose()
    }

    async fn insert_assignment(&self, new: &NewAssignment) -> Result<Option<Assignment>, CoreError> {
        AssignmentRepo::insert(&self.pool, new)
            .await
            .map_err(db_err)?
            .map(|row| row.into_assignment(new.kind).map_err(corrupt))
            .transpose()
    }

    async fn delete_assignment(&self, kind: AssignmentKind, id: DbId) -> Result<bool, CoreError> {
        let deleted = AssignmentRepo::delete(&self.pool, kind, id)
            .await
            .map_err(db_err)?;
        if deleted {
            ReminderRepo::clear(&self.pool, kind, id)
                .await
                .map_err(db_err)?;
        }
        Ok(deleted)
    }

    async fn update_assignment_state(
        &self,
        kind: AssignmentKind,
        id: DbId,
        update: &AssignmentStateUpdate,
    ) -> Result<(), CoreError> {
        let updated = AssignmentRepo::update_state(&self.pool, kind, id, update)
            .await
            .map_err(db_err)?;
        if !updated {
            return Err(CoreError::NotFound {
                entity: "assignment",
                id,
            });
        }
        Ok(())
    }

    async fn department_assignments(&self, department_id: DbId) -> Result<Vec<Assignment>, CoreError> {
        let mut all = Vec::new();
        for kind in KINDS {
            let rows = AssignmentRepo::list_for_department(&self.pool, kind, department_id)
                .await
                .map_err(db_err)?;
            all.extend(into_assignments(kind, rows)?);
        }
        Ok(all)
    }

    async fn department_assignments_for_target(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<Assignment>, CoreError> {
        let rows = AssignmentRepo::list_departments_for_target(&self.pool, kind, target_id)
            .await
            .map_err(db_err)?;
        into_assignments(kind, rows)
    }

    async fn user_assignments_for_target(
        &self,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<Assignment>, CoreError> {
        let rows = AssignmentRepo::list_users_for_target(&self.pool, kind, target_id)
            .await
            .map_err(db_err)?;
        into_assignments(kind, rows)
    }

    async fn user_assignments(&self, user_id: DbId) -> Result<Vec<Assignment>, CoreError> {
        let mut all = Vec::new();
        for kind in KINDS {
            let rows = AssignmentRepo::list_for_user(&self.pool, kind, user_id)
                .await
                .map_err(db_err)?;
            all.extend(into_assignments(kind, rows)?);
        }
        Ok(all)
    }

    // -- item progress -----------------------------------------------------

    async fn insert_item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
        item_ids: &[DbId],
    ) -> Result<u64, CoreError> {
        ItemProgressRepo::insert_missing(&self.pool, kind, assignment_id, item_ids)
            .await
            .map_err(db_err)
    }

    async fn item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<Vec<ItemProgress>, CoreError> {
        let rows = ItemProgressRepo::list(&self.pool, kind, assignment_id)
            .await
            .map_err(db_err)?;
        into_progress(rows)
    }

    async fn save_item_progress(
        &self,
        kind: AssignmentKind,
        progress: &ItemProgress,
    ) -> Result<(), CoreError> {
        ItemProgressRepo::upsert(&self.pool, kind, progress)
            .await
            .map_err(db_err)
    }

    async fn delete_item_progress(
        &self,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<u64, CoreError> {
        ItemProgressRepo::delete_for_assignment(&self.pool, kind, assignment_id)
            .await
            .map_err(db_err)
    }

    // -- rewards and notifications -----------------------------------------

    async fn award_badge(
        &self,
        user_id: DbId,
        program_id: DbId,
        title: &str,
    ) -> Result<bool, CoreError> {
        BadgeRepo::award(&self.pool, user_id, program_id, title)
            .await
            .map_err(db_err)
    }

    async fn insert_notification(&self, notification: &NewNotification) -> Result<(), CoreError> {
        NotificationRepo::create(&self.pool, notification)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
