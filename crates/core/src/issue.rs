//! Issue status machine, fixed enumerations, and field validation.
//!
//! Statuses, categories, and priorities are stored as lowercase text columns;
//! the constants here are the single source of truth for accepted values.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Initial status for a newly submitted issue.
pub const STATUS_REPORTED: &str = "reported";
/// An agent is actively working on the issue.
pub const STATUS_IN_PROGRESS: &str = "in_progress";
/// The underlying problem has been fixed.
pub const STATUS_RESOLVED: &str = "resolved";
/// The issue has been closed (resolved and verified, or won't-fix).
pub const STATUS_CLOSED: &str = "closed";

/// All valid issue statuses, in lifecycle order.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_REPORTED,
    STATUS_IN_PROGRESS,
    STATUS_RESOLVED,
    STATUS_CLOSED,
];

/// Whether a status marks the issue as done and sets the resolution timestamp.
pub fn is_terminal_status(status: &str) -> bool {
    status == STATUS_RESOLVED || status == STATUS_CLOSED
}

// ---------------------------------------------------------------------------
// Category and priority constants
// ---------------------------------------------------------------------------

/// All valid issue categories.
pub const VALID_CATEGORIES: &[&str] = &[
    "pothole",
    "street_light",
    "garbage",
    "water_supply",
    "sewage",
    "road_damage",
    "public_safety",
    "other",
];

pub const PRIORITY_LOW: &str = "low";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_CRITICAL: &str = "critical";

/// All valid issue priorities.
pub const VALID_PRIORITIES: &[&str] = &[
    PRIORITY_LOW,
    PRIORITY_MEDIUM,
    PRIORITY_HIGH,
    PRIORITY_CRITICAL,
];

// ---------------------------------------------------------------------------
// Field limits
// ---------------------------------------------------------------------------

/// Maximum length for an issue title (characters).
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for an issue description (characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// Maximum number of images attached to one issue.
pub const MAX_IMAGES: usize = 5;

/// Maximum number of free-form tags on one issue.
pub const MAX_TAGS: usize = 10;

// ---------------------------------------------------------------------------
// Transition policy
// ---------------------------------------------------------------------------

/// Which status transitions the lifecycle engine accepts.
///
/// The transition relation is an explicit, injectable policy rather than a
/// hard-coded rule: production wires [`TransitionPolicy::AnyTarget`], which
/// accepts every valid target status regardless of the current one.
/// [`TransitionPolicy::ForwardOnly`] restricts transitions to later stages
/// of `reported -> in_progress -> resolved -> closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any valid status is an accepted target.
    #[default]
    AnyTarget,
    /// Only forward movement through the lifecycle is accepted.
    ForwardOnly,
}

impl TransitionPolicy {
    /// Validate a transition from `current` to `next` under this policy.
    ///
    /// Both statuses must already be validated via [`validate_status`].
    pub fn validate_transition(&self, current: &str, next: &str) -> Result<(), CoreError> {
        match self {
            TransitionPolicy::AnyTarget => Ok(()),
            TransitionPolicy::ForwardOnly => {
                let current_idx = stage_index(current)?;
                let next_idx = stage_index(next)?;
                if next_idx > current_idx {
                    Ok(())
                } else {
                    Err(CoreError::Validation(format!(
                        "Cannot transition issue from '{current}' to '{next}': \
                         only forward transitions are allowed"
                    )))
                }
            }
        }
    }
}

fn stage_index(status: &str) -> Result<usize, CoreError> {
    VALID_STATUSES
        .iter()
        .position(|s| *s == status)
        .ok_or_else(|| invalid_status(status))
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

fn invalid_status(status: &str) -> CoreError {
    CoreError::Validation(format!(
        "Invalid issue status '{status}'. Must be one of: {}",
        VALID_STATUSES.join(", ")
    ))
}

/// Validate that a status string is one of the known statuses.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(invalid_status(status))
    }
}

/// Validate that a category string is one of the known categories.
pub fn validate_category(category: &str) -> Result<(), CoreError> {
    if VALID_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid issue category '{category}'. Must be one of: {}",
            VALID_CATEGORIES.join(", ")
        )))
    }
}

/// Validate that a priority string is one of the known priorities.
pub fn validate_priority(priority: &str) -> Result<(), CoreError> {
    if VALID_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid issue priority '{priority}'. Must be one of: {}",
            VALID_PRIORITIES.join(", ")
        )))
    }
}

/// Validate the issue title: non-empty after trimming, within length limit.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters (got {})",
            title.len()
        )));
    }
    Ok(())
}

/// Validate the issue description length.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters (got {})",
            description.len()
        )));
    }
    Ok(())
}

/// Validate the attached image URL list (at most [`MAX_IMAGES`] entries).
pub fn validate_images(image_urls: &[String]) -> Result<(), CoreError> {
    if image_urls.len() > MAX_IMAGES {
        return Err(CoreError::Validation(format!(
            "An issue may have at most {MAX_IMAGES} images (got {})",
            image_urls.len()
        )));
    }
    Ok(())
}

/// Validate the free-form tag list.
pub fn validate_tags(tags: &[String]) -> Result<(), CoreError> {
    if tags.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "An issue may have at most {MAX_TAGS} tags (got {})",
            tags.len()
        )));
    }
    if tags.iter().any(|t| t.trim().is_empty()) {
        return Err(CoreError::Validation(
            "Tags must not be empty strings".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
