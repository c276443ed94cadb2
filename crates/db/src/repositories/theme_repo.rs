//! Repository for the `themes` table.

use sqlx::PgPool;
use trainhub_core::types::DbId;

use crate::models::program::{CreateTheme, Theme};

const COLUMNS: &str = "id, company_id, name, created_at";

pub struct ThemeRepo;

impl ThemeRepo {
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        input: &CreateTheme,
    ) -> Result<Theme, sqlx::Error> {
        let query =
            format!("INSERT INTO themes (company_id, name) VALUES ($1, $2) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Theme>(&query)
            .bind(company_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Theme>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM themes WHERE id = $1");
        sqlx::query_as::<_, Theme>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_company(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<Theme>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM themes WHERE company_id = $1 ORDER BY name");
        sqlx::query_as::<_, Theme>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }
}
