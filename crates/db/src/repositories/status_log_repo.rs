//! Read-side repository for the append-only `status_log` table.
//!
//! Entries are only ever written inside `IssueRepo` transactions; this
//! repository exposes the audit trail for listing.

use civiclens_core::types::DbId;
use sqlx::PgPool;

use crate::models::status_log::StatusLogEntry;

/// Column list for `status_log` queries.
pub(crate) const LOG_COLUMNS: &str = "\
    id, issue_id, status, previous_status, changed_by_id, comment, \
    estimated_resolution_date, is_system, created_at";

/// Provides read access to the status transition audit trail.
pub struct StatusLogRepo;

impl StatusLogRepo {
    /// List all transitions for an issue, oldest first.
    pub async fn list_by_issue(
        pool: &PgPool,
        issue_id: DbId,
    ) -> Result<Vec<StatusLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM status_log \
             WHERE issue_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, StatusLogEntry>(&query)
            .bind(issue_id)
            .fetch_all(pool)
            .await
    }

    /// Count transitions recorded for an issue.
    pub async fn count_by_issue(pool: &PgPool, issue_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM status_log WHERE issue_id = $1")
            .bind(issue_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
