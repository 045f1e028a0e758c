//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Query-parameter structs for list endpoints

pub mod flag;
pub mod issue;
pub mod status_log;
pub mod user;
