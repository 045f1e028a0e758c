//! Handlers for the community moderation pipeline: flag filing, the admin
//! review queue, review decisions, and flag deletion.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use civiclens_core::error::CoreError;
use civiclens_core::moderation::{self, ReReviewGuard};
use civiclens_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use civiclens_core::types::DbId;
use civiclens_db::models::flag::{CreateFlag, Flag, FlagListParams, ReviewFlag};
use civiclens_db::models::issue::Issue;
use civiclens_db::repositories::FlagRepo;

use crate::error::{is_duplicate_flag_violation, AppError, AppResult};
use crate::handlers::issues::reject_if_hidden;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Re-review behavior wired into this deployment: reviews of already-terminal
/// flags overwrite the prior decision (see [`ReReviewGuard`] for the
/// hardened alternative).
const RE_REVIEW_GUARD: ReReviewGuard = ReReviewGuard::Allow;

/// Result of filing a flag: the new flag plus the parent issue as left after
/// the moderation policy ran.
#[derive(Debug, Serialize)]
pub struct FlagFiledResult {
    pub flag: Flag,
    pub issue: Issue,
}

/// Result of a review decision.
#[derive(Debug, Serialize)]
pub struct FlagReviewResult {
    pub flag: Flag,
    /// Present when the review forced the parent issue hidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
}

// ---------------------------------------------------------------------------
// POST /issues/{id}/flags
// ---------------------------------------------------------------------------

/// File a moderation flag against an issue.
///
/// One flag per (issue, user): a second attempt returns 409 DUPLICATE_FLAG.
/// Filing increments the issue's flag count and re-runs the auto-hide
/// policy; flagging a hidden issue is forbidden.
pub async fn file_flag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(issue_id): Path<DbId>,
    Json(input): Json<CreateFlag>,
) -> AppResult<impl IntoResponse> {
    moderation::validate_flag_reason(&input.reason)?;

    reject_if_hidden(&state, issue_id, "cannot flag a hidden issue").await?;

    let (flag, issue) = FlagRepo::create(&state.pool, issue_id, auth.user_id, &input)
        .await
        .map_err(|err| {
            if is_duplicate_flag_violation(&err) {
                AppError::Core(CoreError::DuplicateFlag {
                    issue_id,
                    user_id: auth.user_id,
                })
            } else {
                AppError::Database(err)
            }
        })?;

    tracing::info!(
        flag_id = flag.id,
        issue_id,
        user_id = auth.user_id,
        reason = %flag.reason,
        flag_count = issue.flag_count,
        auto_hidden = issue.is_hidden,
        "Flag filed",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: FlagFiledResult { flag, issue },
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /issues/{id}/flags
// ---------------------------------------------------------------------------

/// List all flags filed against one issue. Admin only.
pub async fn list_issue_flags(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(issue_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let flags = FlagRepo::list_by_issue(&state.pool, issue_id).await?;
    Ok(Json(DataResponse { data: flags }))
}

// ---------------------------------------------------------------------------
// GET /admin/flags
// ---------------------------------------------------------------------------

/// The admin review queue: flags across all issues, oldest first, with
/// optional status and issue filters.
pub async fn list_flags(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<FlagListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref s) = params.status {
        moderation::validate_flag_status(s)?;
    }

    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    let flags = FlagRepo::list_filtered(
        &state.pool,
        params.status.as_deref(),
        params.issue_id,
        limit,
        offset,
    )
    .await?;

    Ok(Json(DataResponse { data: flags }))
}

// ---------------------------------------------------------------------------
// PUT /admin/flags/{id}/review
// ---------------------------------------------------------------------------

/// Record a review decision on a flag. Admin only.
///
/// The review status must be terminal (`reviewed`, `dismissed`, or
/// `approved`). An action of "Issue Hidden" forces the parent issue hidden
/// with the reviewer as actor; other actions are recorded for audit only.
pub async fn review_flag(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewFlag>,
) -> AppResult<impl IntoResponse> {
    moderation::validate_review_status(&input.status)?;
    if let Some(ref action) = input.action_taken {
        moderation::validate_review_action(action)?;
    }

    let current = FlagRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Flag", id }))?;

    RE_REVIEW_GUARD.check(&current.status)?;

    let (flag, issue) = FlagRepo::review(&state.pool, id, admin.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Flag", id }))?;

    tracing::info!(
        flag_id = id,
        issue_id = flag.issue_id,
        status = %flag.status,
        action = flag.action_taken.as_deref().unwrap_or("none"),
        user_id = admin.user_id,
        "Flag reviewed",
    );

    Ok(Json(DataResponse {
        data: FlagReviewResult { flag, issue },
    }))
}

// ---------------------------------------------------------------------------
// DELETE /admin/flags/{id}
// ---------------------------------------------------------------------------

/// Delete a flag, recomputing the parent issue's flag count. Admin only.
///
/// Dropping below the auto-hide threshold never restores visibility.
pub async fn delete_flag(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let issue = FlagRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Flag", id }))?;

    tracing::info!(
        flag_id = id,
        issue_id = issue.id,
        flag_count = issue.flag_count,
        user_id = admin.user_id,
        "Flag deleted",
    );

    Ok(Json(DataResponse { data: issue }))
}
