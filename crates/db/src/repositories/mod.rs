//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Multi-statement mutations
//! (status transitions, votes, flag filing) run in a single transaction so
//! concurrent requests against the same issue serialize on its row.

pub mod flag_repo;
pub mod issue_repo;
pub mod status_log_repo;
pub mod user_repo;

pub use flag_repo::FlagRepo;
pub use issue_repo::IssueRepo;
pub use status_log_repo::StatusLogRepo;
pub use user_repo::UserRepo;
