//! Theme, training program and module entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::engine::TargetRecord;
use trainhub_core::module_content::ModuleContent;
use trainhub_core::prerequisites::{PrerequisiteType, ProgramGate};
use trainhub_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `themes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Theme {
    pub id: DbId,
    pub company_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTheme {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// A row from the `training_programs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Program {
    pub id: DbId,
    pub company_id: DbId,
    pub theme_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
    pub prerequisite_type: String,
    pub prerequisite_course_ids: Vec<DbId>,
    pub passing_score: i16,
    pub badge_enabled: bool,
    pub badge_title: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Program {
    pub fn gate(&self) -> Result<ProgramGate, String> {
        Ok(ProgramGate {
            id: self.id,
            theme_id: self.theme_id,
            order_index: self.order_index,
            prerequisite_type: PrerequisiteType::from_str_value(&self.prerequisite_type)?,
            prerequisite_course_ids: self.prerequisite_course_ids.clone(),
        })
    }

    /// The engine's view of this program. The badge title falls back to the
    /// program title when badges are enabled without one.
    pub fn into_target(self) -> Result<TargetRecord, String> {
        let gate = self.gate()?;
        let badge_title = self
            .badge_enabled
            .then(|| self.badge_title.clone().unwrap_or_else(|| self.title.clone()));
        Ok(TargetRecord {
            kind: AssignmentKind::Program,
            id: self.id,
            company_id: self.company_id,
            title: self.title,
            passing_score: self.passing_score,
            badge_title,
            gate: Some(gate),
        })
    }
}

/// DTO for creating a program in the caller's company.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProgram {
    pub theme_id: Option<DbId>,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub description: Option<String>,
    pub order_index: Option<i32>,
    pub prerequisite_type: Option<String>,
    pub prerequisite_course_ids: Option<Vec<DbId>>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i16>,
    pub badge_enabled: Option<bool>,
    pub badge_title: Option<String>,
}

/// DTO for updating a program. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProgram {
    pub theme_id: Option<DbId>,
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub order_index: Option<i32>,
    pub prerequisite_type: Option<String>,
    pub prerequisite_course_ids: Option<Vec<DbId>>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i16>,
    pub badge_enabled: Option<bool>,
    pub badge_title: Option<String>,
}

/// A row from the `modules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Module {
    pub id: DbId,
    pub program_id: DbId,
    pub title: String,
    pub order_index: i32,
    pub content: Json<ModuleContent>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for appending a module to a program.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateModule {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub order_index: Option<i32>,
    pub content: ModuleContent,
}
