//! Interface to the external identity system.
//!
//! CivicLens does not issue credentials or manage passwords; it only
//! validates the HS256 access tokens the identity system mints and extracts
//! the authenticated principal (`{id, role}`) from them.

pub mod jwt;
