//! Repository for the `issues` table, its voter set, and status transitions.

use chrono::NaiveDate;
use civiclens_core::issue::{is_terminal_status, PRIORITY_MEDIUM, STATUS_REPORTED};
use civiclens_core::types::DbId;
use sqlx::PgPool;

use crate::models::issue::{CreateIssue, Issue};
use crate::models::status_log::StatusLogEntry;
use crate::repositories::status_log_repo::LOG_COLUMNS;

/// Column list for `issues` queries.
const COLUMNS: &str = "\
    id, title, description, category, status, priority, longitude, latitude, \
    address, image_urls, tags, upvote_count, flag_count, is_hidden, \
    hidden_reason, hidden_by_id, reported_by_id, assigned_to_id, resolved_at, \
    created_at, updated_at";

/// Provides CRUD, voting, and lifecycle operations for issues.
pub struct IssueRepo;

impl IssueRepo {
    /// Create a new issue in status `reported` together with its
    /// system-generated initial status-log entry, in one transaction.
    pub async fn create(
        pool: &PgPool,
        reported_by_id: DbId,
        input: &CreateIssue,
    ) -> Result<Issue, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO issues \
                (title, description, category, priority, longitude, latitude, \
                 address, image_urls, tags, reported_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        let issue = sqlx::query_as::<_, Issue>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.priority.as_deref().unwrap_or(PRIORITY_MEDIUM))
            .bind(input.longitude)
            .bind(input.latitude)
            .bind(&input.address)
            .bind(&input.image_urls)
            .bind(&input.tags)
            .bind(reported_by_id)
            .fetch_one(&mut *tx)
            .await?;

        // Initial audit entry, attributed to the creator but system-generated.
        sqlx::query(
            "INSERT INTO status_log (issue_id, status, previous_status, changed_by_id, is_system) \
             VALUES ($1, $2, NULL, $3, TRUE)",
        )
        .bind(issue.id)
        .bind(STATUS_REPORTED)
        .bind(reported_by_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(issue)
    }

    /// Find an issue by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Issue>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM issues WHERE id = $1");
        sqlx::query_as::<_, Issue>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List issues with optional filters, newest first.
    ///
    /// Hidden issues are excluded unless `include_hidden` is set (the handler
    /// only sets it for agents/admins). Geospatial filtering happens on the
    /// returned page in the API layer; everything index-friendly is here.
    #[allow(clippy::too_many_arguments)]
    pub async fn list_filtered(
        pool: &PgPool,
        category: Option<&str>,
        status: Option<&str>,
        priority: Option<&str>,
        tag: Option<&str>,
        search: Option<&str>,
        include_hidden: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Issue>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if category.is_some() {
            conditions.push(format!("category = ${param_idx}"));
            param_idx += 1;
        }
        if status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }
        if priority.is_some() {
            conditions.push(format!("priority = ${param_idx}"));
            param_idx += 1;
        }
        if tag.is_some() {
            conditions.push(format!("${param_idx} = ANY(tags)"));
            param_idx += 1;
        }
        if search.is_some() {
            conditions.push(format!(
                "(title ILIKE ${param_idx} OR description ILIKE ${param_idx})"
            ));
            param_idx += 1;
        }
        if !include_hidden {
            conditions.push("is_hidden = FALSE".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM issues {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, Issue>(&query);

        if let Some(c) = category {
            q = q.bind(c);
        }
        if let Some(s) = status {
            q = q.bind(s);
        }
        if let Some(p) = priority {
            q = q.bind(p);
        }
        if let Some(t) = tag {
            q = q.bind(t);
        }
        if let Some(s) = search {
            q = q.bind(format!("%{s}%"));
        }
        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// Apply a status transition and append its audit entry atomically.
    ///
    /// Locks the issue row, records the immediately-prior status in the new
    /// `status_log` entry, updates the status together with any supplied
    /// assignee, and sets `resolved_at` the first time the issue enters a
    /// terminal status (subsequent terminal transitions never reset it).
    ///
    /// Returns `None` if the issue does not exist.
    pub async fn change_status(
        pool: &PgPool,
        issue_id: DbId,
        changed_by_id: DbId,
        new_status: &str,
        comment: Option<&str>,
        assigned_to_id: Option<DbId>,
        estimated_resolution_date: Option<NaiveDate>,
    ) -> Result<Option<(Issue, StatusLogEntry)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM issues WHERE id = $1 FOR UPDATE")
                .bind(issue_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((previous_status,)) = current else {
            return Ok(None);
        };

        let update = format!(
            "UPDATE issues SET \
                status = $2, \
                assigned_to_id = COALESCE($3, assigned_to_id), \
                resolved_at = CASE WHEN $4 AND resolved_at IS NULL THEN now() \
                              ELSE resolved_at END, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let issue = sqlx::query_as::<_, Issue>(&update)
            .bind(issue_id)
            .bind(new_status)
            .bind(assigned_to_id)
            .bind(is_terminal_status(new_status))
            .fetch_one(&mut *tx)
            .await?;

        let log_insert = format!(
            "INSERT INTO status_log \
                (issue_id, status, previous_status, changed_by_id, comment, \
                 estimated_resolution_date, is_system) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE) \
             RETURNING {LOG_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, StatusLogEntry>(&log_insert)
            .bind(issue_id)
            .bind(new_status)
            .bind(&previous_status)
            .bind(changed_by_id)
            .bind(comment)
            .bind(estimated_resolution_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((issue, entry)))
    }

    /// Add a user to the issue's voter set.
    ///
    /// Idempotent: a repeated upvote is reported via the returned `bool`
    /// (`false` = already voted) rather than as an error. `upvote_count` is
    /// recomputed from the voter table inside the same transaction.
    ///
    /// Returns `None` if the issue does not exist.
    pub async fn upvote(
        pool: &PgPool,
        issue_id: DbId,
        user_id: DbId,
    ) -> Result<Option<(Issue, bool)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM issues WHERE id = $1 FOR UPDATE")
                .bind(issue_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let inserted = sqlx::query(
            "INSERT INTO issue_upvotes (issue_id, user_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(issue_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let issue = Self::recount_upvotes(&mut tx, issue_id).await?;

        tx.commit().await?;
        Ok(Some((issue, inserted)))
    }

    /// Remove a user from the issue's voter set.
    ///
    /// A no-op (reported via the returned `bool`) when the user had not
    /// voted. Returns `None` if the issue does not exist.
    pub async fn remove_upvote(
        pool: &PgPool,
        issue_id: DbId,
        user_id: DbId,
    ) -> Result<Option<(Issue, bool)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM issues WHERE id = $1 FOR UPDATE")
                .bind(issue_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let removed =
            sqlx::query("DELETE FROM issue_upvotes WHERE issue_id = $1 AND user_id = $2")
                .bind(issue_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                == 1;

        let issue = Self::recount_upvotes(&mut tx, issue_id).await?;

        tx.commit().await?;
        Ok(Some((issue, removed)))
    }

    async fn recount_upvotes(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        issue_id: DbId,
    ) -> Result<Issue, sqlx::Error> {
        let query = format!(
            "UPDATE issues SET \
                upvote_count = (SELECT COUNT(*) FROM issue_upvotes WHERE issue_id = $1), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Issue>(&query)
            .bind(issue_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Set or clear the issue's visibility suppression.
    ///
    /// When hiding, `reason` and `actor` record who and why; when restoring,
    /// both are cleared. Returns `None` if the issue does not exist.
    pub async fn set_visibility(
        pool: &PgPool,
        issue_id: DbId,
        hidden: bool,
        reason: Option<&str>,
        actor: Option<DbId>,
    ) -> Result<Option<Issue>, sqlx::Error> {
        let query = format!(
            "UPDATE issues SET \
                is_hidden = $2, hidden_reason = $3, hidden_by_id = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Issue>(&query)
            .bind(issue_id)
            .bind(hidden)
            .bind(reason)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Delete an issue. Cascades to its upvotes, status-log entries, and
    /// flags via foreign keys. Returns whether a row was deleted.
    pub async fn delete(pool: &PgPool, issue_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(issue_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
