use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::assignments;
use crate::state::AppState;

/// `{kind}` is `program` or `checklist`. `{id}` is the target, except on
/// `unlock` where it is the user assignment.
///
/// ```text
/// GET    /{kind}/{id}                               target_overview (instructor)
/// POST   /{kind}/{id}                               assign (admin)
/// DELETE /{kind}/{id}/users/{user_id}               unassign_user (admin)
/// DELETE /{kind}/{id}/departments/{department_id}   unassign_department (admin)
/// POST   /{kind}/{id}/unlock                        unlock (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{kind}/{id}",
            get(assignments::target_overview).post(assignments::assign),
        )
        .route(
            "/{kind}/{id}/users/{user_id}",
            delete(assignments::unassign_user),
        )
        .route(
            "/{kind}/{id}/departments/{department_id}",
            delete(assignments::unassign_department),
        )
        .route("/{kind}/{id}/unlock", post(assignments::unlock))
}
