//! Repository for the `departments` and `user_departments` tables.

use sqlx::PgPool;
use trainhub_core::types::DbId;

use crate::models::department::{CreateDepartment, Department, DepartmentMember};

/// Column list for `departments` queries.
const COLUMNS: &str = "id, company_id, name, created_at, updated_at";

/// Provides CRUD operations for departments and their membership.
pub struct DepartmentRepo;

impl DepartmentRepo {
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        input: &CreateDepartment,
    ) -> Result<Department, sqlx::Error> {
        let query = format!(
            "INSERT INTO departments (company_id, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(company_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Department>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM departments WHERE id = $1");
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_company(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<Department>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM departments WHERE company_id = $1 ORDER BY name");
        sqlx::query_as::<_, Department>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a department. Memberships and department assignment rows go
    /// with it; member assignments must be cleaned up by the caller first.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add a user to a department. Returns `false` if already a member.
    pub async fn add_member(
        pool: &PgPool,
        department_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_departments (user_id, department_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(department_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_member(
        pool: &PgPool,
        department_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_departments WHERE user_id = $1 AND department_id = $2")
                .bind(user_id)
                .bind(department_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn member_ids(pool: &PgPool, department_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM user_departments WHERE department_id = $1 ORDER BY user_id",
        )
        .bind(department_id)
        .fetch_all(pool)
        .await
    }

    /// Members with their profile fields, for the admin department view.
    pub async fn list_members(
        pool: &PgPool,
        department_id: DbId,
    ) -> Result<Vec<DepartmentMember>, sqlx::Error> {
        sqlx::query_as::<_, DepartmentMember>(
            "SELECT u.id AS user_id, u.email, u.full_name, ud.created_at AS joined_at
             FROM user_departments ud
             JOIN users u ON u.id = ud.user_id
             WHERE ud.department_id = $1
             ORDER BY u.full_name",
        )
        .bind(department_id)
        .fetch_all(pool)
        .await
    }

    pub async fn department_ids_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT department_id FROM user_departments WHERE user_id = $1 ORDER BY department_id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
