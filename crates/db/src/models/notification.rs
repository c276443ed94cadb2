//! Notification entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trainhub_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
///
/// The same shape is published by the insert trigger as JSON, so it also
/// deserializes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: Timestamp,
}
