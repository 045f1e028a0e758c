//! Pure domain logic for the CivicLens issue-reporting platform.
//!
//! This crate has no internal dependencies and no I/O. It defines the error
//! taxonomy, shared types, role constants, geospatial math, the issue status
//! machine, and the moderation policy used by the DB and API layers.

pub mod error;
pub mod geo;
pub mod issue;
pub mod moderation;
pub mod pagination;
pub mod roles;
pub mod types;
