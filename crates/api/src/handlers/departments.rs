//! Handlers for the `/departments` resource.
//!
//! Membership changes run through the learning engine so that department
//! assignments follow users in and out.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use trainhub_core::assignment::Recipient;
use trainhub_core::error::CoreError;
use trainhub_core::types::DbId;
use trainhub_db::models::department::{AddMember, CreateDepartment, Department, DepartmentMember};
use trainhub_db::repositories::DepartmentRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DepartmentDetail {
    #[serde(flatten)]
    pub department: Department,
    pub members: Vec<DepartmentMember>,
}

/// Load a department and check it belongs to the caller's company.
async fn load_department(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Department> {
    let department = DepartmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "department",
            id,
        }))?;
    auth.actor()
        .ensure_same_company("department", id, department.company_id)?;
    Ok(department)
}

/// GET /api/v1/departments
pub async fn list_departments(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let departments = DepartmentRepo::list_for_company(&state.pool, auth.company_id).await?;
    Ok(Json(DataResponse { data: departments }))
}

/// POST /api/v1/departments
pub async fn create_department(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateDepartment>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let department = DepartmentRepo::create(&state.pool, admin.company_id, &input).await?;

    tracing::info!(
        department_id = department.id,
        company_id = admin.company_id,
        user_id = admin.user_id,
        "Department created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}

/// GET /api/v1/departments/{id}
pub async fn get_department(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let department = load_department(&state, &auth, id).await?;
    let members = DepartmentRepo::list_members(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: DepartmentDetail {
            department,
            members,
        },
    }))
}

/// DELETE /api/v1/departments/{id}
///
/// Withdraws everything assigned through the department before deleting
/// it, so members keep only what they hold directly or via another
/// department.
pub async fn delete_department(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_department(&state, &admin, id).await?;
    let actor = admin.actor();

    let held = state.engine.store().department_assignments(id).await?;
    let mut removed = 0;
    for assignment in held {
        removed += state
            .engine
            .unassign(&actor, assignment.kind, assignment.target_id, Recipient::Department(id))
            .await?;
    }
    for user_id in DepartmentRepo::member_ids(&state.pool, id).await? {
        removed += state
            .engine
            .on_user_leaves_department(&actor, id, user_id)
            .await?;
    }
    DepartmentRepo::delete(&state.pool, id).await?;

    tracing::info!(
        department_id = id,
        removed_assignments = removed,
        user_id = admin.user_id,
        "Department deleted",
    );

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/departments/{id}/members
pub async fn add_member(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddMember>,
) -> AppResult<impl IntoResponse> {
    let summary = state
        .engine
        .on_user_joins_department(&admin.actor(), id, input.user_id)
        .await?;
    let message = summary.message();
    Ok(Json(DataResponse {
        data: serde_json::json!({
            "summary": summary,
            "message": message,
        }),
    }))
}

/// DELETE /api/v1/departments/{id}/members/{user_id}
pub async fn remove_member(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let removed = state
        .engine
        .on_user_leaves_department(&admin.actor(), id, user_id)
        .await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "removed_assignments": removed }),
    }))
}
