pub mod flags;
pub mod issues;
