//! Badge entity model.

use serde::Serialize;
use sqlx::FromRow;
use trainhub_core::types::{DbId, Timestamp};

/// A row from the `badges` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Badge {
    pub id: DbId,
    pub user_id: DbId,
    pub program_id: DbId,
    pub title: String,
    pub awarded_at: Timestamp,
}
