//! Repository for the `training_programs` and `modules` tables.

use sqlx::types::Json;
use sqlx::PgPool;
use trainhub_core::prerequisites::PrerequisiteType;
use trainhub_core::quiz::DEFAULT_PASSING_SCORE;
use trainhub_core::types::DbId;

use crate::models::program::{CreateModule, CreateProgram, Module, Program, UpdateProgram};

/// Column list for `training_programs` queries.
const COLUMNS: &str = "id, company_id, theme_id, title, description, order_index, \
    prerequisite_type, prerequisite_course_ids, passing_score, badge_enabled, badge_title, \
    created_by, created_at, updated_at";

/// Column list for `modules` queries.
const MODULE_COLUMNS: &str = "id, program_id, title, order_index, content, created_at, updated_at";

/// Provides CRUD operations for programs and their modules.
pub struct ProgramRepo;

impl ProgramRepo {
    /// Insert a new program, returning the created row.
    ///
    /// Prerequisites are expected to be validated against the company's
    /// catalog before calling this.
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        created_by: DbId,
        input: &CreateProgram,
    ) -> Result<Program, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_programs
                (company_id, theme_id, title, description, order_index, prerequisite_type,
                 prerequisite_course_ids, passing_score, badge_enabled, badge_title, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Program>(&query)
            .bind(company_id)
            .bind(input.theme_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.order_index.unwrap_or(0))
            .bind(
                input
                    .prerequisite_type
                    .as_deref()
                    .unwrap_or(PrerequisiteType::None.as_str()),
            )
            .bind(input.prerequisite_course_ids.clone().unwrap_or_default())
            .bind(input.passing_score.unwrap_or(DEFAULT_PASSING_SCORE))
            .bind(input.badge_enabled.unwrap_or(false))
            .bind(&input.badge_title)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Program>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM training_programs WHERE id = $1");
        sqlx::query_as::<_, Program>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All programs of a company, grouped by theme in order.
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<Program>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM training_programs
             WHERE company_id = $1
             ORDER BY theme_id NULLS FIRST, order_index, id"
        );
        sqlx::query_as::<_, Program>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Update a program. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProgram,
    ) -> Result<Option<Program>, sqlx::Error> {
        let query = format!(
            "UPDATE training_programs SET
                theme_id = COALESCE($2, theme_id),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                order_index = COALESCE($5, order_index),
                prerequisite_type = COALESCE($6, prerequisite_type),
                prerequisite_course_ids = COALESCE($7, prerequisite_course_ids),
                passing_score = COALESCE($8, passing_score),
                badge_enabled = COALESCE($9, badge_enabled),
                badge_title = COALESCE($10, badge_title)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Program>(&query)
            .bind(id)
            .bind(input.theme_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.order_index)
            .bind(&input.prerequisite_type)
            .bind(&input.prerequisite_course_ids)
            .bind(input.passing_score)
            .bind(input.badge_enabled)
            .bind(&input.badge_title)
            .fetch_optional(pool)
            .await
    }

    // -- modules -----------------------------------------------------------

    /// Append a module. Without an explicit `order_index` it goes last.
    pub async fn create_module(
        pool: &PgPool,
        program_id: DbId,
        input: &CreateModule,
    ) -> Result<Module, sqlx::Error> {
        let query = format!(
            "INSERT INTO modules (program_id, title, order_index, content)
             VALUES ($1, $2,
                     COALESCE($3, (SELECT COALESCE(MAX(order_index) + 1, 0)
                                   FROM modules WHERE program_id = $1)),
                     $4)
             RETURNING {MODULE_COLUMNS}"
        );
        sqlx::query_as::<_, Module>(&query)
            .bind(program_id)
            .bind(&input.title)
            .bind(input.order_index)
            .bind(Json(&input.content))
            .fetch_one(pool)
            .await
    }

    pub async fn list_modules(pool: &PgPool, program_id: DbId) -> Result<Vec<Module>, sqlx::Error> {
        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM modules WHERE program_id = $1 ORDER BY order_index, id"
        );
        sqlx::query_as::<_, Module>(&query)
            .bind(program_id)
            .fetch_all(pool)
            .await
    }

    pub async fn module_ids(pool: &PgPool, program_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM modules WHERE program_id = $1 ORDER BY order_index, id")
            .bind(program_id)
            .fetch_all(pool)
            .await
    }

    /// Find a module, scoped to its program.
    pub async fn find_module(
        pool: &PgPool,
        program_id: DbId,
        module_id: DbId,
    ) -> Result<Option<Module>, sqlx::Error> {
        let query =
            format!("SELECT {MODULE_COLUMNS} FROM modules WHERE id = $1 AND program_id = $2");
        sqlx::query_as::<_, Module>(&query)
            .bind(module_id)
            .bind(program_id)
            .fetch_optional(pool)
            .await
    }
}
