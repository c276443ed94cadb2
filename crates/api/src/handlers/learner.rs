//! Handlers for the calling learner under `/me`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use trainhub_core::assignment::AssignmentKind;
use trainhub_core::engine::{AssignmentView, ItemOutcome, ItemProgress};
use trainhub_core::types::DbId;
use trainhub_db::repositories::BadgeRepo;

use super::assignments::parse_kind;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub view: AssignmentView,
    pub items: Vec<ItemProgress>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteItemRequest {
    #[serde(default)]
    pub time_spent_secs: i64,
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<usize>,
    #[serde(default)]
    pub time_spent_secs: i64,
}

fn ensure_time(time_spent_secs: i64) -> AppResult<()> {
    if time_spent_secs < 0 {
        return Err(AppError::BadRequest(
            "time_spent_secs must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/v1/me/assignments
pub async fn list_my_assignments(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let views = state
        .engine
        .learner_overview(&auth.actor(), Utc::now())
        .await?;
    Ok(Json(DataResponse { data: views }))
}

/// GET /api/v1/me/assignments/{kind}/{assignment_id}
pub async fn get_my_assignment(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((kind, assignment_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let view = state
        .engine
        .resolve_assignment(&auth.actor(), kind, assignment_id, Utc::now())
        .await?;
    let items = state.engine.store().item_progress(kind, assignment_id).await?;
    Ok(Json(DataResponse {
        data: AssignmentDetail { view, items },
    }))
}

/// POST /api/v1/me/assignments/{kind}/{assignment_id}/items/{item_id}/start
pub async fn start_item(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((kind, assignment_id, item_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let progress = state
        .engine
        .start_item(&auth.actor(), kind, assignment_id, item_id)
        .await?;
    Ok(Json(DataResponse { data: progress }))
}

/// POST /api/v1/me/assignments/{kind}/{assignment_id}/items/{item_id}/complete
pub async fn complete_item(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((kind, assignment_id, item_id)): Path<(String, DbId, DbId)>,
    body: Option<Json<CompleteItemRequest>>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let Json(input) = body.unwrap_or_default();
    ensure_time(input.time_spent_secs)?;

    let outcome = ItemOutcome {
        time_spent_secs: input.time_spent_secs,
        quiz: None,
    };
    let result = state
        .engine
        .complete_item(&auth.actor(), kind, assignment_id, item_id, outcome)
        .await?;
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/me/assignments/{kind}/{assignment_id}/items/{item_id}/quiz
///
/// Only program modules carry quizzes.
pub async fn submit_quiz(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((kind, assignment_id, item_id)): Path<(String, DbId, DbId)>,
    Json(input): Json<QuizSubmission>,
) -> AppResult<impl IntoResponse> {
    if parse_kind(&kind)? != AssignmentKind::Program {
        return Err(AppError::BadRequest(
            "Quizzes can only be submitted for program modules".to_string(),
        ));
    }
    ensure_time(input.time_spent_secs)?;

    let result = state
        .engine
        .submit_quiz(
            &auth.actor(),
            assignment_id,
            item_id,
            &input.answers,
            input.time_spent_secs,
        )
        .await?;
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/me/badges
pub async fn list_my_badges(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let badges = BadgeRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: badges }))
}
