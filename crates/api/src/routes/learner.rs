use axum::routing::{get, post};
use axum::Router;

use crate::handlers::learner;
use crate::state::AppState;

/// ```text
/// GET    /assignments                                          list_my_assignments
/// GET    /assignments/{kind}/{id}                              get_my_assignment
/// POST   /assignments/{kind}/{id}/items/{item_id}/start        start_item
/// POST   /assignments/{kind}/{id}/items/{item_id}/complete     complete_item
/// POST   /assignments/{kind}/{id}/items/{item_id}/quiz         submit_quiz
/// GET    /badges                                               list_my_badges
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assignments", get(learner::list_my_assignments))
        .route("/assignments/{kind}/{id}", get(learner::get_my_assignment))
        .route(
            "/assignments/{kind}/{id}/items/{item_id}/start",
            post(learner::start_item),
        )
        .route(
            "/assignments/{kind}/{id}/items/{item_id}/complete",
            post(learner::complete_item),
        )
        .route(
            "/assignments/{kind}/{id}/items/{item_id}/quiz",
            post(learner::submit_quiz),
        )
        .route("/badges", get(learner::list_my_badges))
}
