//! Handlers for the issue lifecycle: creation, listing, status transitions,
//! voting, and visibility.
//!
//! All endpoints require authentication. Status transitions and assignment
//! are staff-only; deletion and explicit visibility changes are admin-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use civiclens_core::error::CoreError;
use civiclens_core::geo::{self, Coordinates};
use civiclens_core::issue::{self, TransitionPolicy};
use civiclens_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use civiclens_core::roles::is_staff;
use civiclens_core::types::DbId;
use civiclens_db::models::issue::{
    ChangeIssueStatus, CreateIssue, Issue, IssueListParams, IssueWithDistance, SetIssueVisibility,
};
use civiclens_db::models::status_log::StatusLogEntry;
use civiclens_db::repositories::{IssueRepo, StatusLogRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAgent};
use crate::response::DataResponse;
use crate::state::AppState;

/// Transition relation wired into this deployment: any valid status is an
/// accepted target (see [`TransitionPolicy`] for the hardened alternative).
const TRANSITION_POLICY: TransitionPolicy = TransitionPolicy::AnyTarget;

/// Fallback reason recorded for a manual admin hide without one.
const MANUAL_HIDE_REASON: &str = "hidden by administrator";

/// Result of a status transition: the updated issue plus the audit entry
/// appended for it.
#[derive(Debug, Serialize)]
pub struct StatusChangeResult {
    pub issue: Issue,
    pub log_entry: StatusLogEntry,
}

/// Result of a vote operation.
#[derive(Debug, Serialize)]
pub struct VoteResult {
    pub issue: Issue,
    /// False when the vote was already in the requested state.
    pub changed: bool,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// POST /issues
// ---------------------------------------------------------------------------

/// Submit a new issue. Any authenticated principal may report.
///
/// The issue starts in status `reported` with a system-generated initial
/// status-log entry attributed to the creator.
pub async fn create_issue(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateIssue>,
) -> AppResult<impl IntoResponse> {
    issue::validate_title(&input.title)?;
    issue::validate_description(&input.description)?;
    issue::validate_category(&input.category)?;
    if let Some(ref p) = input.priority {
        issue::validate_priority(p)?;
    }
    issue::validate_images(&input.image_urls)?;
    issue::validate_tags(&input.tags)?;
    Coordinates::new(input.longitude, input.latitude).validate()?;

    let created = IssueRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        issue_id = created.id,
        user_id = auth.user_id,
        category = %created.category,
        "Issue reported",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// GET /issues
// ---------------------------------------------------------------------------

/// List issues with optional filters and proximity search.
///
/// Category/status/priority/tag/text filters are applied in SQL first. When
/// a center point is supplied, the page is filtered to candidates within
/// `radius_km` (when given) and each result is annotated with its distance,
/// nearest first. Hidden issues are excluded unless an agent/admin passes
/// `include_hidden=true`.
pub async fn list_issues(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<IssueListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref s) = params.status {
        issue::validate_status(s)?;
    }
    if let Some(ref c) = params.category {
        issue::validate_category(c)?;
    }
    if let Some(ref p) = params.priority {
        issue::validate_priority(p)?;
    }

    let center = match (params.longitude, params.latitude) {
        (Some(longitude), Some(latitude)) => {
            let center = Coordinates::new(longitude, latitude);
            center.validate()?;
            Some(center)
        }
        (None, None) => None,
        _ => {
            return Err(AppError::Core(CoreError::InvalidCoordinates(
                "Both longitude and latitude must be supplied for proximity search".into(),
            )))
        }
    };
    if let Some(radius) = params.radius_km {
        if !radius.is_finite() || radius < 0.0 {
            return Err(AppError::BadRequest(format!(
                "radius_km must be a non-negative number, got {radius}"
            )));
        }
        if center.is_none() {
            return Err(AppError::BadRequest(
                "radius_km requires a center point (longitude and latitude)".into(),
            ));
        }
    }

    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    // Citizens never see hidden issues, regardless of the flag.
    let include_hidden = params.include_hidden && is_staff(&auth.role);

    let issues = IssueRepo::list_filtered(
        &state.pool,
        params.category.as_deref(),
        params.status.as_deref(),
        params.priority.as_deref(),
        params.tag.as_deref(),
        params.q.as_deref(),
        include_hidden,
        limit,
        offset,
    )
    .await?;

    let results: Vec<IssueWithDistance> = match center {
        Some(center) => {
            let mut annotated = geo::within_radius(
                center,
                params.radius_km.unwrap_or(f64::INFINITY),
                issues,
                |i| Coordinates::new(i.longitude, i.latitude),
            );
            annotated.sort_by(|a, b| a.1.total_cmp(&b.1));
            annotated
                .into_iter()
                .map(|(issue, d)| IssueWithDistance {
                    issue,
                    distance_km: Some(d),
                })
                .collect()
        }
        None => issues
            .into_iter()
            .map(|issue| IssueWithDistance {
                issue,
                distance_km: None,
            })
            .collect(),
    };

    Ok(Json(DataResponse { data: results }))
}

// ---------------------------------------------------------------------------
// GET /issues/{id}
// ---------------------------------------------------------------------------

/// Get a single issue by ID.
///
/// Hidden issues are visible only to staff and to their reporter; everyone
/// else gets 404 so hidden content is not discoverable.
pub async fn get_issue(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = fetch_visible_issue(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: found }))
}

// ---------------------------------------------------------------------------
// GET /issues/{id}/status-log
// ---------------------------------------------------------------------------

/// List the full status transition audit trail for an issue, oldest first.
pub async fn get_status_log(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    // Same visibility rule as the issue itself.
    fetch_visible_issue(&state, &auth, id).await?;

    let entries = StatusLogRepo::list_by_issue(&state.pool, id).await?;
    Ok(Json(DataResponse { data: entries }))
}

// ---------------------------------------------------------------------------
// PUT /issues/{id}/status
// ---------------------------------------------------------------------------

/// Apply a status transition. Agent or admin only.
///
/// Appends exactly one status-log entry recording the prior status, sets the
/// resolution timestamp the first time the issue enters resolved/closed, and
/// applies any supplied assignee / estimated resolution date atomically with
/// the status.
pub async fn change_status(
    RequireAgent(agent): RequireAgent,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeIssueStatus>,
) -> AppResult<impl IntoResponse> {
    issue::validate_status(&input.status)?;

    let current = IssueRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Issue", id }))?;

    TRANSITION_POLICY.validate_transition(&current.status, &input.status)?;

    let (updated, log_entry) = IssueRepo::change_status(
        &state.pool,
        id,
        agent.user_id,
        &input.status,
        input.comment.as_deref(),
        input.assigned_to_id,
        input.estimated_resolution_date,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Issue", id }))?;

    tracing::info!(
        issue_id = id,
        from = %log_entry.previous_status.as_deref().unwrap_or("none"),
        to = %updated.status,
        user_id = agent.user_id,
        "Issue status changed",
    );

    Ok(Json(DataResponse {
        data: StatusChangeResult {
            issue: updated,
            log_entry,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /issues/{id}/upvote
// ---------------------------------------------------------------------------

/// Upvote an issue. Idempotent: repeating the vote reports "already voted"
/// rather than failing. Voting on a hidden issue is forbidden.
pub async fn upvote_issue(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    reject_if_hidden(&state, id, "cannot vote on hidden issue").await?;

    let (updated, changed) = IssueRepo::upvote(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Issue", id }))?;

    tracing::debug!(issue_id = id, user_id = auth.user_id, changed, "Upvote");

    Ok(Json(DataResponse {
        data: VoteResult {
            issue: updated,
            changed,
            message: if changed { "vote recorded" } else { "already voted" },
        },
    }))
}

// ---------------------------------------------------------------------------
// DELETE /issues/{id}/upvote
// ---------------------------------------------------------------------------

/// Remove the caller's upvote. A no-op when no vote exists.
pub async fn remove_upvote(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    reject_if_hidden(&state, id, "cannot vote on hidden issue").await?;

    let (updated, changed) = IssueRepo::remove_upvote(&state.pool, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Issue", id }))?;

    Ok(Json(DataResponse {
        data: VoteResult {
            issue: updated,
            changed,
            message: if changed {
                "vote removed"
            } else {
                "no vote to remove"
            },
        },
    }))
}

// ---------------------------------------------------------------------------
// PUT /issues/{id}/visibility
// ---------------------------------------------------------------------------

/// Explicitly hide or restore an issue. Admin only.
///
/// This is the only path that restores visibility; the moderation pipeline
/// never auto-unhides.
pub async fn set_visibility(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetIssueVisibility>,
) -> AppResult<impl IntoResponse> {
    let (reason, actor) = if input.hidden {
        (
            Some(input.reason.as_deref().unwrap_or(MANUAL_HIDE_REASON)),
            Some(admin.user_id),
        )
    } else {
        (None, None)
    };

    let updated = IssueRepo::set_visibility(&state.pool, id, input.hidden, reason, actor)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Issue", id }))?;

    tracing::info!(
        issue_id = id,
        hidden = input.hidden,
        user_id = admin.user_id,
        "Issue visibility changed",
    );

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// DELETE /issues/{id}
// ---------------------------------------------------------------------------

/// Delete an issue and everything attached to it (votes, status log, flags).
/// Admin only.
pub async fn delete_issue(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = IssueRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound { entity: "Issue", id }));
    }

    tracing::info!(issue_id = id, user_id = admin.user_id, "Issue deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Fetch an issue, applying the visibility rule: hidden issues exist only
/// for staff and their reporter.
pub(crate) async fn fetch_visible_issue(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
) -> AppResult<Issue> {
    let found = IssueRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Issue", id }))?;

    if found.is_hidden && !is_staff(&auth.role) && found.reported_by_id != auth.user_id {
        return Err(AppError::Core(CoreError::NotFound { entity: "Issue", id }));
    }

    Ok(found)
}

/// Reject mutations against a hidden issue with 403.
pub(crate) async fn reject_if_hidden(
    state: &AppState,
    id: DbId,
    message: &str,
) -> AppResult<Issue> {
    let found = IssueRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Issue", id }))?;

    if found.is_hidden {
        return Err(AppError::Core(CoreError::Forbidden(message.to_string())));
    }

    Ok(found)
}
