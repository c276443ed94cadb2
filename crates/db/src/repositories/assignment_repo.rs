//! Repository for `program_assignments` and `checklist_assignments`.
//!
//! Both tables share one shape; every method takes the [`AssignmentKind`]
//! that selects the table. The target column is read back as `target_id`.

use sqlx::PgPool;
use trainhub_core::assignment::{AssignmentKind, AssignmentState, Recipient};
use trainhub_core::engine::{AssignmentStateUpdate, NewAssignment};
use trainhub_core::types::{DbId, Timestamp};

use crate::models::assignment::AssignmentRow;

/// Table and target column for an assignment kind.
fn table(kind: AssignmentKind) -> (&'static str, &'static str) {
    match kind {
        AssignmentKind::Program => ("program_assignments", "program_id"),
        AssignmentKind::Checklist => ("checklist_assignments", "checklist_id"),
    }
}

fn columns(target_column: &str) -> String {
    format!(
        "id, {target_column} AS target_id, assigned_to_user_id, assigned_to_department_id, \
         status, assigned_by, assigned_at, due_date, completed_at, progress_pct, is_auto_assigned"
    )
}

/// Provides assignment storage for both target kinds.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Insert an assignment unless one already exists for the same target
    /// and recipient. Returns `None` when the row already existed.
    pub async fn insert(
        pool: &PgPool,
        new: &NewAssignment,
    ) -> Result<Option<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(new.kind);
        let query = format!(
            "INSERT INTO {table}
                ({target}, assigned_to_user_id, assigned_to_department_id, status,
                 assigned_by, due_date, is_auto_assigned)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT DO NOTHING
             RETURNING {}",
            columns(target)
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(new.target_id)
            .bind(new.recipient.user_id())
            .bind(new.recipient.department_id())
            .bind(AssignmentState::Assigned.as_str())
            .bind(new.assigned_by)
            .bind(new.due_date)
            .bind(new.is_auto_assigned)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        kind: AssignmentKind,
        id: DbId,
    ) -> Result<Option<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(kind);
        let query = format!("SELECT {} FROM {table} WHERE id = $1", columns(target));
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the assignment of a target to a specific recipient.
    pub async fn find_for_recipient(
        pool: &PgPool,
        kind: AssignmentKind,
        target_id: DbId,
        recipient: Recipient,
    ) -> Result<Option<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(kind);
        let (recipient_column, recipient_id) = match recipient {
            Recipient::User(id) => ("assigned_to_user_id", id),
            Recipient::Department(id) => ("assigned_to_department_id", id),
        };
        let query = format!(
            "SELECT {} FROM {table} WHERE {target} = $1 AND {recipient_column} = $2",
            columns(target)
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(target_id)
            .bind(recipient_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete an assignment. Item progress rows must already be gone.
    pub async fn delete(pool: &PgPool, kind: AssignmentKind, id: DbId) -> Result<bool, sqlx::Error> {
        let (table, _) = table(kind);
        let query = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_state(
        pool: &PgPool,
        kind: AssignmentKind,
        id: DbId,
        update: &AssignmentStateUpdate,
    ) -> Result<bool, sqlx::Error> {
        let (table, _) = table(kind);
        let query = format!(
            "UPDATE {table} SET status = $2, progress_pct = $3, completed_at = $4 WHERE id = $1"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(update.status.as_str())
            .bind(update.progress_pct)
            .bind(update.completed_at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rows addressed to a department.
    pub async fn list_for_department(
        pool: &PgPool,
        kind: AssignmentKind,
        department_id: DbId,
    ) -> Result<Vec<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(kind);
        let query = format!(
            "SELECT {} FROM {table} WHERE assigned_to_department_id = $1 ORDER BY id",
            columns(target)
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(department_id)
            .fetch_all(pool)
            .await
    }

    /// Department rows of a target.
    pub async fn list_departments_for_target(
        pool: &PgPool,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(kind);
        let query = format!(
            "SELECT {} FROM {table}
             WHERE {target} = $1 AND assigned_to_department_id IS NOT NULL
             ORDER BY id",
            columns(target)
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(target_id)
            .fetch_all(pool)
            .await
    }

    /// User rows of a target.
    pub async fn list_users_for_target(
        pool: &PgPool,
        kind: AssignmentKind,
        target_id: DbId,
    ) -> Result<Vec<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(kind);
        let query = format!(
            "SELECT {} FROM {table}
             WHERE {target} = $1 AND assigned_to_user_id IS NOT NULL
             ORDER BY id",
            columns(target)
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(target_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        kind: AssignmentKind,
        user_id: DbId,
    ) -> Result<Vec<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(kind);
        let query = format!(
            "SELECT {} FROM {table} WHERE assigned_to_user_id = $1 ORDER BY assigned_at, id",
            columns(target)
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Open user assignments due before `horizon`, overdue ones included.
    pub async fn list_due_open(
        pool: &PgPool,
        kind: AssignmentKind,
        horizon: Timestamp,
    ) -> Result<Vec<AssignmentRow>, sqlx::Error> {
        let (table, target) = table(kind);
        let query = format!(
            "SELECT {} FROM {table}
             WHERE assigned_to_user_id IS NOT NULL
               AND completed_at IS NULL
               AND due_date IS NOT NULL
               AND due_date <= $1
             ORDER BY due_date, id",
            columns(target)
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(horizon)
            .fetch_all(pool)
            .await
    }
}
