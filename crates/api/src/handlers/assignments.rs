//! Handlers for `/assignments/{kind}/...`.
//!
//! `kind` is `program` or `checklist`. Every route resolves the target in
//! the caller's company before touching assignments.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use trainhub_core::assignment::{AssignOptions, AssignmentKind, Recipient};
use trainhub_core::types::{DbId, Timestamp};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireInstructor};
use crate::response::DataResponse;
use crate::state::AppState;

/// Parse the `{kind}` path segment.
pub(crate) fn parse_kind(kind: &str) -> AppResult<AssignmentKind> {
    AssignmentKind::from_str_value(kind).map_err(AppError::BadRequest)
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub user_ids: Vec<DbId>,
    #[serde(default)]
    pub department_ids: Vec<DbId>,
    pub due_date: Option<Timestamp>,
}

impl AssignRequest {
    fn recipients(&self) -> Vec<Recipient> {
        self.user_ids
            .iter()
            .map(|id| Recipient::User(*id))
            .chain(self.department_ids.iter().map(|id| Recipient::Department(*id)))
            .collect()
    }
}

/// POST /api/v1/assignments/{kind}/{id}
pub async fn assign(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, target_id)): Path<(String, DbId)>,
    Json(input): Json<AssignRequest>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let options = AssignOptions {
        due_date: input.due_date,
        assigned_by: Some(admin.user_id),
    };
    let summary = state
        .engine
        .assign(&admin.actor(), kind, target_id, &input.recipients(), &options)
        .await?;
    let message = summary.message();

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: serde_json::json!({
                "summary": summary,
                "message": message,
            }),
        }),
    ))
}

/// GET /api/v1/assignments/{kind}/{id}
pub async fn target_overview(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Path((kind, target_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let overview = state
        .engine
        .target_overview(&user.actor(), kind, target_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: overview }))
}

/// DELETE /api/v1/assignments/{kind}/{id}/users/{user_id}
pub async fn unassign_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, target_id, user_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let removed = state
        .engine
        .unassign(&admin.actor(), kind, target_id, Recipient::User(user_id))
        .await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "removed_assignments": removed }),
    }))
}

/// DELETE /api/v1/assignments/{kind}/{id}/departments/{department_id}
pub async fn unassign_department(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, target_id, department_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let removed = state
        .engine
        .unassign(
            &admin.actor(),
            kind,
            target_id,
            Recipient::Department(department_id),
        )
        .await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "removed_assignments": removed }),
    }))
}

/// POST /api/v1/assignments/{kind}/{id}/unlock
///
/// Here `{id}` is the user assignment to release, not the target.
pub async fn unlock(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, assignment_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let assignment = state
        .engine
        .unlock(&admin.actor(), kind, assignment_id)
        .await?;
    Ok(Json(DataResponse { data: assignment }))
}
