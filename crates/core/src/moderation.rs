//! Community flagging constants and the auto-hide moderation policy.
//!
//! The policy functions here are pure; the DB layer applies their decisions
//! inside the same transaction that mutates the flag counters.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Flag reasons
// ---------------------------------------------------------------------------

/// All valid flag reasons.
pub const VALID_FLAG_REASONS: &[&str] = &[
    "spam",
    "inappropriate",
    "duplicate",
    "false_report",
    "other",
];

// ---------------------------------------------------------------------------
// Flag statuses
// ---------------------------------------------------------------------------

/// A freshly filed flag awaiting admin review.
pub const FLAG_STATUS_PENDING: &str = "pending";
/// Reviewed without a moderation decision either way.
pub const FLAG_STATUS_REVIEWED: &str = "reviewed";
/// Dismissed as unfounded.
pub const FLAG_STATUS_DISMISSED: &str = "dismissed";
/// Upheld; moderation action was taken.
pub const FLAG_STATUS_APPROVED: &str = "approved";

/// All valid flag statuses.
pub const VALID_FLAG_STATUSES: &[&str] = &[
    FLAG_STATUS_PENDING,
    FLAG_STATUS_REVIEWED,
    FLAG_STATUS_DISMISSED,
    FLAG_STATUS_APPROVED,
];

/// Statuses an admin review may assign (everything except `pending`).
pub const REVIEW_TARGET_STATUSES: &[&str] = &[
    FLAG_STATUS_REVIEWED,
    FLAG_STATUS_DISMISSED,
    FLAG_STATUS_APPROVED,
];

// ---------------------------------------------------------------------------
// Review actions
// ---------------------------------------------------------------------------

/// Review action that forces the parent issue hidden.
pub const ACTION_ISSUE_HIDDEN: &str = "Issue Hidden";

/// All valid `action_taken` values. Only [`ACTION_ISSUE_HIDDEN`] mutates
/// issue state; the rest are recorded for audit.
pub const VALID_REVIEW_ACTIONS: &[&str] = &[
    "No Action",
    ACTION_ISSUE_HIDDEN,
    "Issue Deleted",
    "User Warned",
];

// ---------------------------------------------------------------------------
// Auto-hide policy
// ---------------------------------------------------------------------------

/// Number of distinct-user flags at which an issue is hidden automatically.
pub const AUTO_HIDE_FLAG_THRESHOLD: i64 = 5;

/// Visibility reason recorded for a threshold-triggered hide (system action,
/// no actor).
pub const AUTO_HIDE_REASON: &str = "auto-hidden: flag threshold exceeded";

/// Visibility reason recorded when a review with [`ACTION_ISSUE_HIDDEN`]
/// forces the issue hidden (actor = reviewer).
pub const REVIEW_HIDE_REASON: &str = "hidden due to flag review";

/// Decide whether an issue should be auto-hidden after a flag-count change.
///
/// Evaluated on every new flag, not only at the crossing point. There is no
/// auto-unhide: once hidden, only admin review restores visibility, so an
/// already-hidden issue never re-triggers (the reason is never overwritten).
pub fn should_auto_hide(flag_count: i64, is_hidden: bool) -> bool {
    !is_hidden && flag_count >= AUTO_HIDE_FLAG_THRESHOLD
}

// ---------------------------------------------------------------------------
// Re-review guard
// ---------------------------------------------------------------------------

/// Whether a flag that already carries a terminal review may be reviewed
/// again.
///
/// Defaults to [`ReReviewGuard::Allow`], mirroring observed production
/// behavior; [`ReReviewGuard::RejectTerminal`] is the hardened variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReReviewGuard {
    /// Re-reviewing a terminal flag overwrites the prior review.
    #[default]
    Allow,
    /// Re-reviewing a terminal flag is rejected with a conflict.
    RejectTerminal,
}

impl ReReviewGuard {
    /// Check whether a flag in `current_status` may be reviewed.
    pub fn check(&self, current_status: &str) -> Result<(), CoreError> {
        match self {
            ReReviewGuard::Allow => Ok(()),
            ReReviewGuard::RejectTerminal => {
                if current_status == FLAG_STATUS_PENDING {
                    Ok(())
                } else {
                    Err(CoreError::Conflict(format!(
                        "Flag has already been reviewed (status '{current_status}')"
                    )))
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate that a flag reason is one of the known reasons.
pub fn validate_flag_reason(reason: &str) -> Result<(), CoreError> {
    if VALID_FLAG_REASONS.contains(&reason) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid flag reason '{reason}'. Must be one of: {}",
            VALID_FLAG_REASONS.join(", ")
        )))
    }
}

/// Validate that a flag status is one of the known statuses.
pub fn validate_flag_status(status: &str) -> Result<(), CoreError> {
    if VALID_FLAG_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid flag status '{status}'. Must be one of: {}",
            VALID_FLAG_STATUSES.join(", ")
        )))
    }
}

/// Validate that a review assigns a terminal status (not `pending`).
pub fn validate_review_status(status: &str) -> Result<(), CoreError> {
    if REVIEW_TARGET_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid review status '{status}'. Must be one of: {}",
            REVIEW_TARGET_STATUSES.join(", ")
        )))
    }
}

/// Validate an `action_taken` value.
pub fn validate_review_action(action: &str) -> Result<(), CoreError> {
    if VALID_REVIEW_ACTIONS.contains(&action) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid review action '{action}'. Must be one of: {}",
            VALID_REVIEW_ACTIONS.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
