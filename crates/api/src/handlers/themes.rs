//! Handlers for the `/themes` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use trainhub_db::models::program::CreateTheme;
use trainhub_db::repositories::ThemeRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireInstructor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/themes
pub async fn list_themes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let themes = ThemeRepo::list_for_company(&state.pool, auth.company_id).await?;
    Ok(Json(DataResponse { data: themes }))
}

/// POST /api/v1/themes
pub async fn create_theme(
    RequireInstructor(user): RequireInstructor,
    State(state): State<AppState>,
    Json(input): Json<CreateTheme>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let theme = ThemeRepo::create(&state.pool, user.company_id, &input).await?;
    tracing::info!(theme_id = theme.id, company_id = user.company_id, "Theme created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: theme })))
}
