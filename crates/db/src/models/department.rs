//! Department entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trainhub_core::engine::DepartmentRecord;
use trainhub_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: DbId,
    pub company_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Department> for DepartmentRecord {
    fn from(d: Department) -> Self {
        DepartmentRecord {
            id: d.id,
            company_id: d.company_id,
            name: d.name,
        }
    }
}

/// A department member as listed to admins.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentMember {
    pub user_id: DbId,
    pub email: String,
    pub full_name: String,
    pub joined_at: Timestamp,
}

/// DTO for creating a department in the caller's company.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartment {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// DTO for adding a member to a department.
#[derive(Debug, Deserialize)]
pub struct AddMember {
    pub user_id: DbId,
}
