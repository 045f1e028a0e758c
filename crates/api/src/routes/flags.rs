//! Route definitions for the admin moderation queue.

use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::flags;
use crate::state::AppState;

/// Admin flag routes mounted at `/admin/flags`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /                 -> list_flags (review queue)
/// PUT    /{id}/review      -> review_flag
/// DELETE /{id}             -> delete_flag
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(flags::list_flags))
        .route("/{id}/review", put(flags::review_flag))
        .route("/{id}", delete(flags::delete_flag))
}
