//! Flag entity model and DTOs.

use civiclens_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `flags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Flag {
    pub id: DbId,
    pub issue_id: DbId,
    pub flagged_by_id: DbId,
    pub reason: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub reviewed_by_id: Option<DbId>,
    pub review_notes: Option<String>,
    pub action_taken: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for filing a new flag.
#[derive(Debug, Deserialize)]
pub struct CreateFlag {
    pub reason: String,
    pub description: Option<String>,
    /// Defaults to `medium` when omitted.
    pub priority: Option<String>,
}

/// DTO for an admin review decision.
#[derive(Debug, Deserialize)]
pub struct ReviewFlag {
    /// Terminal status to assign: `reviewed`, `dismissed`, or `approved`.
    pub status: String,
    pub review_notes: Option<String>,
    pub action_taken: Option<String>,
}

/// Query parameters for the admin flag review queue.
#[derive(Debug, Deserialize)]
pub struct FlagListParams {
    pub status: Option<String>,
    pub issue_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
