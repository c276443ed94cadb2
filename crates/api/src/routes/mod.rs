pub mod assignments;
pub mod checklists;
pub mod departments;
pub mod health;
pub mod learner;
pub mod notifications;
pub mod programs;
pub mod themes;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                              notification push
/// /departments                                     list, create
/// /departments/{id}                                get, delete
/// /departments/{id}/members                        add member
/// /departments/{id}/members/{user_id}              remove member
/// /themes                                          list, create
/// /programs                                        list, create
/// /programs/{id}                                   get, update
/// /programs/{id}/modules                           add module
/// /checklists                                      list, create
/// /checklists/{id}                                 get
/// /checklists/{id}/items                           add item
/// /assignments/{kind}/{id}                         overview, assign
/// /assignments/{kind}/{id}/users/{user_id}         unassign user
/// /assignments/{kind}/{id}/departments/{dept_id}   unassign department
/// /assignments/{kind}/{id}/unlock                  release a gated assignment
/// /me/assignments                                  learner dashboard
/// /me/assignments/{kind}/{id}                      one assignment with items
/// /me/assignments/{kind}/{id}/items/{item_id}/...  start, complete, quiz
/// /me/badges                                       earned badges
/// /notifications                                   inbox
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/departments", departments::router())
        .nest("/themes", themes::router())
        .nest("/programs", programs::router())
        .nest("/checklists", checklists::router())
        .nest("/assignments", assignments::router())
        .nest("/me", learner::router())
        .nest("/notifications", notifications::router())
}
