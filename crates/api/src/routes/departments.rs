use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::departments;
use crate::state::AppState;

/// ```text
/// GET    /                          list_departments
/// POST   /                          create_department (admin)
/// GET    /{id}                      get_department
/// DELETE /{id}                      delete_department (admin)
/// POST   /{id}/members              add_member (admin)
/// DELETE /{id}/members/{user_id}    remove_member (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/{id}",
            get(departments::get_department).delete(departments::delete_department),
        )
        .route("/{id}/members", post(departments::add_member))
        .route("/{id}/members/{user_id}", delete(departments::remove_member))
}
