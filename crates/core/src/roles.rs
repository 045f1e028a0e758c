//! Well-known role name constants.
//!
//! Roles are issued by the external identity system and carried in the JWT;
//! these constants must match the values it emits.

pub const ROLE_CITIZEN: &str = "citizen";
pub const ROLE_AGENT: &str = "agent";
pub const ROLE_ADMIN: &str = "admin";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_CITIZEN, ROLE_AGENT, ROLE_ADMIN];

/// Whether a role belongs to municipal staff (agent or admin).
///
/// Staff may transition issue statuses and opt in to seeing hidden issues.
pub fn is_staff(role: &str) -> bool {
    role == ROLE_AGENT || role == ROLE_ADMIN
}
