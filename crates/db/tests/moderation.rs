//! Integration tests for the community moderation pipeline.
//!
//! Exercises the repository layer against a real database to verify that:
//! - One flag per (issue, user) is enforced by the unique constraint
//! - The fifth flag auto-hides the issue with the system as actor
//! - Flags past the threshold leave the hide reason untouched
//! - Deleting flags recomputes the count but never restores visibility
//! - An "Issue Hidden" review decision hides the issue with the reviewer
//!   as actor

use sqlx::PgPool;

use civiclens_core::moderation::{
    ACTION_ISSUE_HIDDEN, AUTO_HIDE_FLAG_THRESHOLD, AUTO_HIDE_REASON, FLAG_STATUS_PENDING,
    REVIEW_HIDE_REASON,
};
use civiclens_core::roles::{ROLE_ADMIN, ROLE_CITIZEN};
use civiclens_core::types::DbId;
use civiclens_db::models::flag::{CreateFlag, ReviewFlag};
use civiclens_db::models::issue::CreateIssue;
use civiclens_db::models::user::CreateUser;
use civiclens_db::repositories::{FlagRepo, IssueRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(username: &str, role: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        role: role.to_string(),
    }
}

fn new_issue(title: &str) -> CreateIssue {
    CreateIssue {
        title: title.to_string(),
        description: String::new(),
        category: "other".to_string(),
        priority: None,
        longitude: 13.405,
        latitude: 52.52,
        address: None,
        image_urls: vec![],
        tags: vec![],
    }
}

fn new_flag(reason: &str) -> CreateFlag {
    CreateFlag {
        reason: reason.to_string(),
        description: None,
        priority: None,
    }
}

/// Seed an issue and file `n` flags against it from `n` fresh users.
/// Returns the issue id as left after the last flag.
async fn flag_n_times(pool: &PgPool, issue_id: DbId, n: usize, prefix: &str) -> DbId {
    for i in 0..n {
        let flagger = UserRepo::create(pool, &new_user(&format!("{prefix}{i}"), ROLE_CITIZEN))
            .await
            .unwrap();
        FlagRepo::create(pool, issue_id, flagger.id, &new_flag("spam"))
            .await
            .unwrap();
    }
    issue_id
}

// ---------------------------------------------------------------------------
// Filing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn filing_a_flag_increments_the_derived_count(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let flagger = UserRepo::create(&pool, &new_user("bob", ROLE_CITIZEN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Suspicious report"))
        .await
        .unwrap();

    let (flag, issue) = FlagRepo::create(&pool, issue.id, flagger.id, &new_flag("spam"))
        .await
        .unwrap();

    assert_eq!(flag.status, FLAG_STATUS_PENDING);
    assert_eq!(flag.reason, "spam");
    assert_eq!(issue.flag_count, 1);
    assert!(!issue.is_hidden);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_flag_by_same_user_violates_unique_constraint(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let flagger = UserRepo::create(&pool, &new_user("bob", ROLE_CITIZEN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Duplicate target"))
        .await
        .unwrap();

    FlagRepo::create(&pool, issue.id, flagger.id, &new_flag("spam"))
        .await
        .unwrap();

    let err = FlagRepo::create(&pool, issue.id, flagger.id, &new_flag("inappropriate"))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_flags_issue_user"));

    // The failed attempt leaves the count untouched.
    let issue = IssueRepo::find_by_id(&pool, issue.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(issue.flag_count, 1);
}

// ---------------------------------------------------------------------------
// Auto-hide threshold
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn threshold_flag_auto_hides_with_system_actor(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Abusive content"))
        .await
        .unwrap();

    let threshold = AUTO_HIDE_FLAG_THRESHOLD as usize;
    flag_n_times(&pool, issue.id, threshold - 1, "flagger").await;

    let issue_row = IssueRepo::find_by_id(&pool, issue.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!issue_row.is_hidden);

    // The flag that reaches the threshold trips the hide.
    let last = UserRepo::create(&pool, &new_user("last", ROLE_CITIZEN))
        .await
        .unwrap();
    let (_, issue_row) = FlagRepo::create(&pool, issue.id, last.id, &new_flag("spam"))
        .await
        .unwrap();

    assert_eq!(issue_row.flag_count as i64, AUTO_HIDE_FLAG_THRESHOLD);
    assert!(issue_row.is_hidden);
    assert_eq!(issue_row.hidden_reason.as_deref(), Some(AUTO_HIDE_REASON));
    assert_eq!(issue_row.hidden_by_id, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn flags_past_the_threshold_leave_hide_state_untouched(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let admin = UserRepo::create(&pool, &new_user("root", ROLE_ADMIN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Pile-on target"))
        .await
        .unwrap();

    // Hidden by an admin first, with a distinct reason and actor.
    IssueRepo::set_visibility(&pool, issue.id, true, Some("manual review"), Some(admin.id))
        .await
        .unwrap()
        .unwrap();

    let (_, issue_row) = {
        let flagger = UserRepo::create(&pool, &new_user("late", ROLE_CITIZEN))
            .await
            .unwrap();
        FlagRepo::create(&pool, issue.id, flagger.id, &new_flag("spam"))
            .await
            .unwrap()
    };

    // Already hidden: the policy does not re-fire and overwrite attribution.
    assert!(issue_row.is_hidden);
    assert_eq!(issue_row.hidden_reason.as_deref(), Some("manual review"));
    assert_eq!(issue_row.hidden_by_id, Some(admin.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_flags_never_restores_visibility(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Hidden by consensus"))
        .await
        .unwrap();

    flag_n_times(&pool, issue.id, AUTO_HIDE_FLAG_THRESHOLD as usize, "flagger").await;

    let flags = FlagRepo::list_by_issue(&pool, issue.id).await.unwrap();
    assert_eq!(flags.len() as i64, AUTO_HIDE_FLAG_THRESHOLD);

    // Delete all flags: count drops to zero, the issue stays hidden.
    for flag in &flags {
        FlagRepo::delete(&pool, flag.id).await.unwrap().unwrap();
    }

    let issue_row = IssueRepo::find_by_id(&pool, issue.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(issue_row.flag_count, 0);
    assert!(issue_row.is_hidden);
    assert_eq!(issue_row.hidden_reason.as_deref(), Some(AUTO_HIDE_REASON));
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_with_issue_hidden_action_hides_with_reviewer_actor(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let flagger = UserRepo::create(&pool, &new_user("bob", ROLE_CITIZEN))
        .await
        .unwrap();
    let admin = UserRepo::create(&pool, &new_user("root", ROLE_ADMIN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Reviewed report"))
        .await
        .unwrap();

    let (flag, _) = FlagRepo::create(&pool, issue.id, flagger.id, &new_flag("inappropriate"))
        .await
        .unwrap();

    let review = ReviewFlag {
        status: "approved".to_string(),
        review_notes: Some("confirmed".to_string()),
        action_taken: Some(ACTION_ISSUE_HIDDEN.to_string()),
    };
    let (flag, hidden_issue) = FlagRepo::review(&pool, flag.id, admin.id, &review)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(flag.status, "approved");
    assert_eq!(flag.reviewed_by_id, Some(admin.id));
    assert!(flag.reviewed_at.is_some());

    let hidden_issue = hidden_issue.unwrap();
    assert!(hidden_issue.is_hidden);
    assert_eq!(hidden_issue.hidden_reason.as_deref(), Some(REVIEW_HIDE_REASON));
    assert_eq!(hidden_issue.hidden_by_id, Some(admin.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_without_hide_action_leaves_issue_visible(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let flagger = UserRepo::create(&pool, &new_user("bob", ROLE_CITIZEN))
        .await
        .unwrap();
    let admin = UserRepo::create(&pool, &new_user("root", ROLE_ADMIN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Dismissed report"))
        .await
        .unwrap();

    let (flag, _) = FlagRepo::create(&pool, issue.id, flagger.id, &new_flag("false_report"))
        .await
        .unwrap();

    let review = ReviewFlag {
        status: "dismissed".to_string(),
        review_notes: None,
        action_taken: Some("No Action".to_string()),
    };
    let (flag, hidden_issue) = FlagRepo::review(&pool, flag.id, admin.id, &review)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(flag.status, "dismissed");
    assert!(hidden_issue.is_none());

    let issue_row = IssueRepo::find_by_id(&pool, issue.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!issue_row.is_hidden);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_queue_filters_by_status(pool: PgPool) {
    let reporter = UserRepo::create(&pool, &new_user("alice", ROLE_CITIZEN))
        .await
        .unwrap();
    let admin = UserRepo::create(&pool, &new_user("root", ROLE_ADMIN))
        .await
        .unwrap();
    let issue = IssueRepo::create(&pool, reporter.id, &new_issue("Queue fodder"))
        .await
        .unwrap();

    flag_n_times(&pool, issue.id, 3, "flagger").await;

    let pending = FlagRepo::list_filtered(&pool, Some(FLAG_STATUS_PENDING), None, 50, 0)
        .await
        .unwrap();
    assert_eq!(pending.len(), 3);

    // Review one; it leaves the pending queue.
    let review = ReviewFlag {
        status: "reviewed".to_string(),
        review_notes: None,
        action_taken: None,
    };
    FlagRepo::review(&pool, pending[0].id, admin.id, &review)
        .await
        .unwrap()
        .unwrap();

    let pending = FlagRepo::list_filtered(&pool, Some(FLAG_STATUS_PENDING), None, 50, 0)
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);

    let by_issue = FlagRepo::list_filtered(&pool, None, Some(issue.id), 50, 0)
        .await
        .unwrap();
    assert_eq!(by_issue.len(), 3);
}
