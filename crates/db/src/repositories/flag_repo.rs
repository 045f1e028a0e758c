//! Repository for the `flags` table and the moderation pipeline.

use civiclens_core::issue::PRIORITY_MEDIUM;
use civiclens_core::moderation::{
    should_auto_hide, ACTION_ISSUE_HIDDEN, AUTO_HIDE_REASON, REVIEW_HIDE_REASON,
};
use civiclens_core::types::DbId;
use sqlx::PgPool;

use crate::models::flag::{CreateFlag, Flag, ReviewFlag};
use crate::models::issue::Issue;

/// Column list for `flags` queries.
const COLUMNS: &str = "\
    id, issue_id, flagged_by_id, reason, description, status, priority, \
    reviewed_by_id, review_notes, action_taken, reviewed_at, created_at";

/// Column list for `issues` rows returned by moderation updates.
const ISSUE_COLUMNS: &str = "\
    id, title, description, category, status, priority, longitude, latitude, \
    address, image_urls, tags, upvote_count, flag_count, is_hidden, \
    hidden_reason, hidden_by_id, reported_by_id, assigned_to_id, resolved_at, \
    created_at, updated_at";

/// Provides flag filing, review, and deletion with counter recomputation.
pub struct FlagRepo;

impl FlagRepo {
    /// File a flag against an issue.
    ///
    /// One transaction: insert the flag (the `uq_flags_issue_user` unique
    /// constraint rejects duplicates per (issue, user)), recompute the
    /// issue's `flag_count` from the flags table, then apply the auto-hide
    /// policy. The recount UPDATE locks the issue row, so concurrent flags
    /// against the same issue serialize here.
    ///
    /// Returns the new flag and the issue as left after moderation.
    pub async fn create(
        pool: &PgPool,
        issue_id: DbId,
        flagged_by_id: DbId,
        input: &CreateFlag,
    ) -> Result<(Flag, Issue), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert = format!(
            "INSERT INTO flags (issue_id, flagged_by_id, reason, description, priority) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let flag = sqlx::query_as::<_, Flag>(&insert)
            .bind(issue_id)
            .bind(flagged_by_id)
            .bind(&input.reason)
            .bind(&input.description)
            .bind(input.priority.as_deref().unwrap_or(PRIORITY_MEDIUM))
            .fetch_one(&mut *tx)
            .await?;

        let mut issue = Self::recount_flags(&mut tx, issue_id).await?;

        if should_auto_hide(i64::from(issue.flag_count), issue.is_hidden) {
            let hide = format!(
                "UPDATE issues SET \
                    is_hidden = TRUE, hidden_reason = $2, hidden_by_id = NULL, \
                    updated_at = now() \
                 WHERE id = $1 \
                 RETURNING {ISSUE_COLUMNS}"
            );
            issue = sqlx::query_as::<_, Issue>(&hide)
                .bind(issue_id)
                .bind(AUTO_HIDE_REASON)
                .fetch_one(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok((flag, issue))
    }

    /// Find a flag by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Flag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM flags WHERE id = $1");
        sqlx::query_as::<_, Flag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List flags for the admin review queue, oldest pending work first.
    pub async fn list_filtered(
        pool: &PgPool,
        status: Option<&str>,
        issue_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Flag>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }
        if issue_id.is_some() {
            conditions.push(format!("issue_id = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM flags {where_clause} \
             ORDER BY created_at ASC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, Flag>(&query);

        if let Some(s) = status {
            q = q.bind(s);
        }
        if let Some(id) = issue_id {
            q = q.bind(id);
        }
        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// List all flags filed against one issue, oldest first.
    pub async fn list_by_issue(pool: &PgPool, issue_id: DbId) -> Result<Vec<Flag>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM flags \
             WHERE issue_id = $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Flag>(&query)
            .bind(issue_id)
            .fetch_all(pool)
            .await
    }

    /// Record an admin review decision on a flag.
    ///
    /// When `action_taken` is "Issue Hidden", the parent issue is forced
    /// hidden with the reviewer as actor, regardless of its flag count.
    /// Other actions are recorded for audit only.
    ///
    /// Returns `None` if the flag does not exist; otherwise the updated flag
    /// and, when visibility was forced, the updated issue.
    pub async fn review(
        pool: &PgPool,
        flag_id: DbId,
        reviewer_id: DbId,
        input: &ReviewFlag,
    ) -> Result<Option<(Flag, Option<Issue>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let update = format!(
            "UPDATE flags SET \
                status = $2, reviewed_by_id = $3, review_notes = $4, \
                action_taken = $5, reviewed_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let flag = sqlx::query_as::<_, Flag>(&update)
            .bind(flag_id)
            .bind(&input.status)
            .bind(reviewer_id)
            .bind(&input.review_notes)
            .bind(&input.action_taken)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(flag) = flag else {
            return Ok(None);
        };

        let issue = if input.action_taken.as_deref() == Some(ACTION_ISSUE_HIDDEN) {
            let hide = format!(
                "UPDATE issues SET \
                    is_hidden = TRUE, hidden_reason = $2, hidden_by_id = $3, \
                    updated_at = now() \
                 WHERE id = $1 \
                 RETURNING {ISSUE_COLUMNS}"
            );
            Some(
                sqlx::query_as::<_, Issue>(&hide)
                    .bind(flag.issue_id)
                    .bind(REVIEW_HIDE_REASON)
                    .bind(reviewer_id)
                    .fetch_one(&mut *tx)
                    .await?,
            )
        } else {
            None
        };

        tx.commit().await?;
        Ok(Some((flag, issue)))
    }

    /// Delete a flag, recomputing the parent issue's `flag_count`.
    ///
    /// Visibility is never restored here: dropping below the auto-hide
    /// threshold does not unhide the issue.
    ///
    /// Returns `None` if the flag does not exist; otherwise the parent issue
    /// as left after the recount.
    pub async fn delete(pool: &PgPool, flag_id: DbId) -> Result<Option<Issue>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted: Option<(DbId,)> =
            sqlx::query_as("DELETE FROM flags WHERE id = $1 RETURNING issue_id")
                .bind(flag_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((issue_id,)) = deleted else {
            return Ok(None);
        };

        let issue = Self::recount_flags(&mut tx, issue_id).await?;

        tx.commit().await?;
        Ok(Some(issue))
    }

    async fn recount_flags(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        issue_id: DbId,
    ) -> Result<Issue, sqlx::Error> {
        let query = format!(
            "UPDATE issues SET \
                flag_count = (SELECT COUNT(*) FROM flags WHERE issue_id = $1), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {ISSUE_COLUMNS}"
        );
        sqlx::query_as::<_, Issue>(&query)
            .bind(issue_id)
            .fetch_one(&mut **tx)
            .await
    }
}
