//! Issue entity model and DTOs.

use chrono::NaiveDate;
use civiclens_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `issues` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Issue {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub priority: String,
    pub longitude: f64,
    pub latitude: f64,
    pub address: Option<String>,
    pub image_urls: Vec<String>,
    pub tags: Vec<String>,
    /// Derived: always equals the row count of `issue_upvotes` for this issue.
    pub upvote_count: i32,
    /// Derived: always equals the row count of `flags` for this issue.
    pub flag_count: i32,
    pub is_hidden: bool,
    pub hidden_reason: Option<String>,
    /// `None` = system action (threshold auto-hide).
    pub hidden_by_id: Option<DbId>,
    pub reported_by_id: DbId,
    pub assigned_to_id: Option<DbId>,
    /// Set exactly once when the issue first enters resolved/closed.
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new issue.
#[derive(Debug, Deserialize)]
pub struct CreateIssue {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    /// Defaults to `medium` when omitted.
    pub priority: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub address: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for a status transition request.
#[derive(Debug, Deserialize)]
pub struct ChangeIssueStatus {
    pub status: String,
    pub comment: Option<String>,
    /// Applied atomically with the status when supplied.
    pub assigned_to_id: Option<DbId>,
    /// Applied atomically with the status when supplied.
    pub estimated_resolution_date: Option<NaiveDate>,
}

/// DTO for an explicit admin visibility change.
#[derive(Debug, Deserialize)]
pub struct SetIssueVisibility {
    pub hidden: bool,
    pub reason: Option<String>,
}

/// Query parameters for listing issues.
#[derive(Debug, Deserialize)]
pub struct IssueListParams {
    pub category: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    /// Free-text search over title and description.
    pub q: Option<String>,
    /// Proximity filter center; both components must be supplied together.
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub radius_km: Option<f64>,
    /// Honored only for agents/admins; citizens never see hidden issues.
    #[serde(default)]
    pub include_hidden: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A listed issue, optionally annotated with its distance from the query
/// center point.
#[derive(Debug, Serialize)]
pub struct IssueWithDistance {
    #[serde(flatten)]
    pub issue: Issue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}
