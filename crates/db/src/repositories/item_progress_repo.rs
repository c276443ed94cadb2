//! Repository for `user_progress` (program modules) and
//! `checklist_item_status` (checklist items).

use sqlx::types::Json;
use sqlx::PgPool;
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::engine::ItemProgress;
use trainhub_core::types::DbId;

use crate::models::assignment::ItemProgressRow;

const PROGRAM_COLUMNS: &str = "assignment_id, module_id AS item_id, status, started_at, \
    completed_at, time_spent_secs, score, correct_count, total_count, passed, answers";

const CHECKLIST_COLUMNS: &str = "assignment_id, item_id, status, started_at, completed_at, \
    time_spent_secs, NULL::smallint AS score, NULL::integer AS correct_count, \
    NULL::integer AS total_count, NULL::boolean AS passed, NULL::jsonb AS answers";

fn table(kind: AssignmentKind) -> (&'static str, &'static str) {
    match kind {
        AssignmentKind::Program => ("user_progress", "module_id"),
        AssignmentKind::Checklist => ("checklist_item_status", "item_id"),
    }
}

/// Provides per-item progress storage for both assignment kinds.
pub struct ItemProgressRepo;

impl ItemProgressRepo {
    /// Create `not_started` rows for the given items, skipping items that
    /// already have one. Returns the number of rows created.
    pub async fn insert_missing(
        pool: &PgPool,
        kind: AssignmentKind,
        assignment_id: DbId,
        item_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        let (table, item) = table(kind);
        let query = format!(
            "INSERT INTO {table} (assignment_id, {item})
             SELECT $1, UNNEST($2::bigint[])
             ON CONFLICT DO NOTHING"
        );
        let result = sqlx::query(&query)
            .bind(assignment_id)
            .bind(item_ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list(
        pool: &PgPool,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<Vec<ItemProgressRow>, sqlx::Error> {
        let (table, item) = table(kind);
        let columns = match kind {
            AssignmentKind::Program => PROGRAM_COLUMNS,
            AssignmentKind::Checklist => CHECKLIST_COLUMNS,
        };
        let query =
            format!("SELECT {columns} FROM {table} WHERE assignment_id = $1 ORDER BY {item}");
        sqlx::query_as::<_, ItemProgressRow>(&query)
            .bind(assignment_id)
            .fetch_all(pool)
            .await
    }

    /// Insert or overwrite the row for `(assignment, item)`.
    pub async fn upsert(
        pool: &PgPool,
        kind: AssignmentKind,
        progress: &ItemProgress,
    ) -> Result<(), sqlx::Error> {
        match kind {
            AssignmentKind::Program => {
                let quiz = progress.quiz.as_ref();
                sqlx::query(
                    "INSERT INTO user_progress
                        (assignment_id, module_id, status, started_at, completed_at,
                         time_spent_secs, score, correct_count, total_count, passed, answers)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                     ON CONFLICT ON CONSTRAINT uq_user_progress_assignment_module DO UPDATE SET
                        status = EXCLUDED.status,
                        started_at = EXCLUDED.started_at,
                        completed_at = EXCLUDED.completed_at,
                        time_spent_secs = EXCLUDED.time_spent_secs,
                        score = EXCLUDED.score,
                        correct_count = EXCLUDED.correct_count,
                        total_count = EXCLUDED.total_count,
                        passed = EXCLUDED.passed,
                        answers = EXCLUDED.answers,
                        updated_at = NOW()",
                )
                .bind(progress.assignment_id)
                .bind(progress.item_id)
                .bind(progress.status.as_str())
                .bind(progress.started_at)
                .bind(progress.completed_at)
                .bind(progress.time_spent_secs)
                .bind(quiz.map(|q| q.score))
                .bind(quiz.map(|q| q.correct_count))
                .bind(quiz.map(|q| q.total_count))
                .bind(quiz.map(|q| q.passed))
                .bind(quiz.map(|q| Json(q.answers.clone())))
                .execute(pool)
                .await?;
            }
            AssignmentKind::Checklist => {
                sqlx::query(
                    "INSERT INTO checklist_item_status
                        (assignment_id, item_id, status, started_at, completed_at, time_spent_secs)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     ON CONFLICT ON CONSTRAINT uq_checklist_item_status_assignment_item DO UPDATE SET
                        status = EXCLUDED.status,
                        started_at = EXCLUDED.started_at,
                        completed_at = EXCLUDED.completed_at,
                        time_spent_secs = EXCLUDED.time_spent_secs,
                        updated_at = NOW()",
                )
                .bind(progress.assignment_id)
                .bind(progress.item_id)
                .bind(progress.status.as_str())
                .bind(progress.started_at)
                .bind(progress.completed_at)
                .bind(progress.time_spent_secs)
                .execute(pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Delete every row of an assignment, returning how many went.
    pub async fn delete_for_assignment(
        pool: &PgPool,
        kind: AssignmentKind,
        assignment_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let (table, _) = table(kind);
        let query = format!("DELETE FROM {table} WHERE assignment_id = $1");
        let result = sqlx::query(&query)
            .bind(assignment_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
