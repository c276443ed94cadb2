use axum::routing::{get, post};
use axum::Router;

use crate::handlers::programs;
use crate::state::AppState;

/// ```text
/// GET    /                  list_programs
/// POST   /                  create_program (instructor)
/// GET    /{id}              get_program
/// PUT    /{id}              update_program (instructor)
/// POST   /{id}/modules      create_module (instructor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(programs::list_programs).post(programs::create_program),
        )
        .route(
            "/{id}",
            get(programs::get_program).put(programs::update_program),
        )
        .route("/{id}/modules", post(programs::create_module))
}
