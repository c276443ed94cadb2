//! User profile entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trainhub_core::engine::UserRecord;
use trainhub_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub company_id: DbId,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        UserRecord {
            id: user.id,
            company_id: user.company_id,
            role: user.role,
        }
    }
}

/// DTO for creating a user profile. `role` defaults to `user`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    pub company_id: DbId,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub role: Option<String>,
}
