//! Repository for the `badges` table.

use sqlx::PgPool;
use trainhub_core::types::DbId;

use crate::models::badge::Badge;

const COLUMNS: &str = "id, user_id, program_id, title, awarded_at";

pub struct BadgeRepo;

impl BadgeRepo {
    /// Award a badge. Returns `false` if the user already holds it.
    pub async fn award(
        pool: &PgPool,
        user_id: DbId,
        program_id: DbId,
        title: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO badges (user_id, program_id, title) VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_badges_user_program DO NOTHING",
        )
        .bind(user_id)
        .bind(program_id)
        .bind(title)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Badge>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM badges WHERE user_id = $1 ORDER BY awarded_at DESC");
        sqlx::query_as::<_, Badge>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
