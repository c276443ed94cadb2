//! Checklist and checklist item entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::engine::TargetRecord;
use trainhub_core::quiz::DEFAULT_PASSING_SCORE;
use trainhub_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `checklists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Checklist {
    pub id: DbId,
    pub company_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Checklist> for TargetRecord {
    fn from(c: Checklist) -> Self {
        TargetRecord {
            kind: AssignmentKind::Checklist,
            id: c.id,
            company_id: c.company_id,
            title: c.title,
            passing_score: DEFAULT_PASSING_SCORE,
            badge_title: None,
            gate: None,
        }
    }
}

/// DTO for creating a checklist in the caller's company.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChecklist {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub description: Option<String>,
}

/// A row from the `checklist_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChecklistItem {
    pub id: DbId,
    pub checklist_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
    pub created_at: Timestamp,
}

/// DTO for appending an item to a checklist.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChecklistItem {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub description: Option<String>,
    pub order_index: Option<i32>,
}
