//! Repository for the `checklists` and `checklist_items` tables.

use sqlx::PgPool;
use trainhub_core::types::DbId;

use crate::models::checklist::{Checklist, ChecklistItem, CreateChecklist, CreateChecklistItem};

const COLUMNS: &str = "id, company_id, title, description, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, checklist_id, title, description, order_index, created_at";

/// Provides CRUD operations for checklists and their items.
pub struct ChecklistRepo;

impl ChecklistRepo {
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        created_by: DbId,
        input: &CreateChecklist,
    ) -> Result<Checklist, sqlx::Error> {
        let query = format!(
            "INSERT INTO checklists (company_id, title, description, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Checklist>(&query)
            .bind(company_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Checklist>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM checklists WHERE id = $1");
        sqlx::query_as::<_, Checklist>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_company(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<Checklist>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM checklists WHERE company_id = $1 ORDER BY title, id");
        sqlx::query_as::<_, Checklist>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Append an item. Without an explicit `order_index` it goes last.
    pub async fn create_item(
        pool: &PgPool,
        checklist_id: DbId,
        input: &CreateChecklistItem,
    ) -> Result<ChecklistItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO checklist_items (checklist_id, title, description, order_index)
             VALUES ($1, $2, $3,
                     COALESCE($4, (SELECT COALESCE(MAX(order_index) + 1, 0)
                                   FROM checklist_items WHERE checklist_id = $1)))
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, ChecklistItem>(&query)
            .bind(checklist_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.order_index)
            .fetch_one(pool)
            .await
    }

    pub async fn list_items(
        pool: &PgPool,
        checklist_id: DbId,
    ) -> Result<Vec<ChecklistItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM checklist_items
             WHERE checklist_id = $1
             ORDER BY order_index, id"
        );
        sqlx::query_as::<_, ChecklistItem>(&query)
            .bind(checklist_id)
            .fetch_all(pool)
            .await
    }

    pub async fn item_ids(pool: &PgPool, checklist_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM checklist_items WHERE checklist_id = $1 ORDER BY order_index, id",
        )
        .bind(checklist_id)
        .fetch_all(pool)
        .await
    }
}
