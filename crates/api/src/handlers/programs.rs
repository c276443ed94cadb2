//! Handlers for the `/programs` resource and its modules.
//!
//! Prerequisite declarations are validated against the company catalog on
//! every write, so a cycle or a cross-theme reference never reaches the
//! database.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::error::CoreError;
use trainhub_core::module_content::validate_module_content;
use trainhub_core::prerequisites::{validate_prerequisites, PrerequisiteType, ProgramGate};
use trainhub_core::quiz::DEFAULT_PASSING_SCORE;
use trainhub_core::types::DbId;
use trainhub_db::models::program::{CreateModule, CreateProgram, Module, Program, UpdateProgram};
use trainhub_db::repositories::{ProgramRepo, ThemeRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireInstructor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    pub modules: Vec<Module>,
}

async fn load_program(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Program> {
    let program = ProgramRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "program",
            id,
        }))?;
    auth.actor()
        .ensure_same_company("program", id, program.company_id)?;
    Ok(program)
}

async fn ensure_theme(state: &AppState, auth: &AuthUser, theme_id: Option<DbId>) -> AppResult<()> {
    let Some(theme_id) = theme_id else {
        return Ok(());
    };
    let theme = ThemeRepo::find_by_id(&state.pool, theme_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "theme",
            id: theme_id,
        }))?;
    auth.actor()
        .ensure_same_company("theme", theme_id, theme.company_id)?;
    Ok(())
}

fn parse_prerequisite_type(value: Option<&str>) -> AppResult<Option<PrerequisiteType>> {
    value
        .map(PrerequisiteType::from_str_value)
        .transpose()
        .map_err(|e| AppError::Core(CoreError::Validation(e)))
}

/// Check a gate against the rest of the company's programs.
async fn check_gate(state: &AppState, company_id: DbId, gate: &ProgramGate) -> AppResult<()> {
    let catalog = state.engine.store().program_gates(company_id).await?;
    validate_prerequisites(gate, &catalog).map_err(|e| AppError::Core(CoreError::Validation(e)))
}

/// GET /api/v1/programs
pub async fn list_programs(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let programs = ProgramRepo::list_for_company(&state.pool, auth.company_id).await?;
    Ok(Json(DataResponse { data: programs }))
}

/// POST /api/v1/programs
pub async fn create_program(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Json(input): Json<CreateProgram>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    ensure_theme(&state, &user, input.theme_id).await?;

    let prerequisite_type = parse_prerequisite_type(input.prerequisite_type.as_deref())?
        .unwrap_or(PrerequisiteType::None);
    let gate = ProgramGate {
        id: 0,
        theme_id: input.theme_id,
        order_index: input.order_index.unwrap_or(0),
        prerequisite_type,
        prerequisite_course_ids: input.prerequisite_course_ids.clone().unwrap_or_default(),
    };
    check_gate(&state, user.company_id, &gate).await?;

    let program = ProgramRepo::create(&state.pool, user.company_id, user.user_id, &input).await?;

    tracing::info!(
        program_id = program.id,
        company_id = user.company_id,
        prerequisite_type = prerequisite_type.as_str(),
        passing_score = input.passing_score.unwrap_or(DEFAULT_PASSING_SCORE),
        "Program created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: program })))
}

/// GET /api/v1/programs/{id}
pub async fn get_program(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let program = load_program(&state, &auth, id).await?;
    let modules = ProgramRepo::list_modules(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: ProgramDetail { program, modules },
    }))
}

/// PUT /api/v1/programs/{id}
///
/// The merged result of the stored program and the update is what gets
/// validated, so changing only the theme still re-checks the gate.
pub async fn update_program(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProgram>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let existing = load_program(&state, &user, id).await?;
    ensure_theme(&state, &user, input.theme_id).await?;

    let current = existing
        .gate()
        .map_err(|e| AppError::Core(CoreError::Internal(e)))?;
    let gate = ProgramGate {
        id,
        theme_id: input.theme_id.or(current.theme_id),
        order_index: input.order_index.unwrap_or(current.order_index),
        prerequisite_type: parse_prerequisite_type(input.prerequisite_type.as_deref())?
            .unwrap_or(current.prerequisite_type),
        prerequisite_course_ids: input
            .prerequisite_course_ids
            .clone()
            .unwrap_or(current.prerequisite_course_ids),
    };
    check_gate(&state, user.company_id, &gate).await?;

    let program = ProgramRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "program",
            id,
        }))?;

    tracing::info!(program_id = id, user_id = user.user_id, "Program updated");
    Ok(Json(DataResponse { data: program }))
}

/// POST /api/v1/programs/{id}/modules
///
/// Every open assignment of the program gets a progress row for the new
/// module.
pub async fn create_module(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateModule>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_module_content(&input.content).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    load_program(&state, &user, id).await?;

    let module = ProgramRepo::create_module(&state.pool, id, &input).await?;
    let backfilled = state
        .engine
        .backfill_item(&user.actor(), AssignmentKind::Program, id, module.id)
        .await?;

    tracing::info!(
        program_id = id,
        module_id = module.id,
        module_type = input.content.type_name(),
        backfilled,
        "Module created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: module })))
}
