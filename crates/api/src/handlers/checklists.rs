//! Handlers for the `/checklists` resource and its items.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::error::CoreError;
use trainhub_core::types::DbId;
use trainhub_db::models::checklist::{
    Checklist, ChecklistItem, CreateChecklist, CreateChecklistItem,
};
use trainhub_db::repositories::ChecklistRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireInstructor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ChecklistDetail {
    #[serde(flatten)]
    pub checklist: Checklist,
    pub items: Vec<ChecklistItem>,
}

async fn load_checklist(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Checklist> {
    let checklist = ChecklistRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "checklist",
            id,
        }))?;
    auth.actor()
        .ensure_same_company("checklist", id, checklist.company_id)?;
    Ok(checklist)
}

/// GET /api/v1/checklists
pub async fn list_checklists(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let checklists = ChecklistRepo::list_for_company(&state.pool, auth.company_id).await?;
    Ok(Json(DataResponse { data: checklists }))
}

/// POST /api/v1/checklists
pub async fn create_checklist(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Json(input): Json<CreateChecklist>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let checklist =
        ChecklistRepo::create(&state.pool, user.company_id, user.user_id, &input).await?;
    tracing::info!(
        checklist_id = checklist.id,
        company_id = user.company_id,
        "Checklist created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: checklist })))
}

/// GET /api/v1/checklists/{id}
pub async fn get_checklist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let checklist = load_checklist(&state, &auth, id).await?;
    let items = ChecklistRepo::list_items(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: ChecklistDetail { checklist, items },
    }))
}

/// POST /api/v1/checklists/{id}/items
pub async fn create_item(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateChecklistItem>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_checklist(&state, &user, id).await?;

    let item = ChecklistRepo::create_item(&state.pool, id, &input).await?;
    let backfilled = state
        .engine
        .backfill_item(&user.actor(), AssignmentKind::Checklist, id, item.id)
        .await?;

    tracing::info!(checklist_id = id, item_id = item.id, backfilled, "Checklist item created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}
