//! Route definitions for the issue lifecycle.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{flags, issues};
use crate::state::AppState;

/// Issue routes mounted at `/issues`.
///
/// Role requirements are enforced by handler extractors.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(issues::create_issue).get(issues::list_issues))
        .route("/{id}", get(issues::get_issue).delete(issues::delete_issue))
        .route("/{id}/status", put(issues::change_status))
        .route("/{id}/status-log", get(issues::get_status_log))
        .route(
            "/{id}/upvote",
            post(issues::upvote_issue).delete(issues::remove_upvote),
        )
        .route("/{id}/visibility", put(issues::set_visibility))
        .route(
            "/{id}/flags",
            post(flags::file_flag).get(flags::list_issue_flags),
        )
}
