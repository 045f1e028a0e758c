pub mod flags;
pub mod health;
pub mod issues;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /issues                       create (POST), list (GET)
/// /issues/{id}                  get (GET), delete (DELETE, admin)
/// /issues/{id}/status           transition (PUT, agent/admin)
/// /issues/{id}/status-log       audit trail (GET)
/// /issues/{id}/upvote           vote (POST), unvote (DELETE)
/// /issues/{id}/visibility       hide/restore (PUT, admin)
/// /issues/{id}/flags            file flag (POST), list (GET, admin)
///
/// /admin/flags                  review queue (GET)
/// /admin/flags/{id}/review      review decision (PUT)
/// /admin/flags/{id}             delete (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/issues", issues::router())
        .nest("/admin/flags", flags::admin_router())
}
