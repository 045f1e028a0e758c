//! Status-log entry model.
//!
//! Entries are append-only: written once by the lifecycle engine and never
//! edited or removed (except by cascade delete of the parent issue).

use chrono::NaiveDate;
use civiclens_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `status_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusLogEntry {
    pub id: DbId,
    pub issue_id: DbId,
    pub status: String,
    /// `None` only for the system-generated initial `reported` entry.
    pub previous_status: Option<String>,
    pub changed_by_id: DbId,
    pub comment: Option<String>,
    pub estimated_resolution_date: Option<NaiveDate>,
    /// True for entries the system wrote on the caller's behalf (the initial
    /// `reported` entry at issue creation).
    pub is_system: bool,
    pub created_at: Timestamp,
}
