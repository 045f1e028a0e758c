//! User entity model and DTOs.
//!
//! Identity and credentials live in the external identity system; this table
//! only anchors attribution foreign keys and role lookups.

use civiclens_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    /// Role name (`citizen`, `agent`, or `admin`).
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for provisioning a user record.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub role: String,
}
