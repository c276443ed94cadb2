use axum::routing::{get, post};
use axum::Router;

use crate::handlers::checklists;
use crate::state::AppState;

/// ```text
/// GET    /                list_checklists
/// POST   /                create_checklist (instructor)
/// GET    /{id}            get_checklist
/// POST   /{id}/items      create_item (instructor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checklists::list_checklists).post(checklists::create_checklist),
        )
        .route("/{id}", get(checklists::get_checklist))
        .route("/{id}/items", post(checklists::create_item))
}
