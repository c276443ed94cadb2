use axum::routing::get;
use axum::Router;

use crate::handlers::themes;
use crate::state::AppState;

/// ```text
/// GET    /    list_themes
/// POST   /    create_theme (instructor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(themes::list_themes).post(themes::create_theme))
}
