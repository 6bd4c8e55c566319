//! Well-known role name constants.
//!
//! Roles are issued by the external identity service and mirrored in the
//! `guards.role` column (see `20260301000001_create_guards.sql`).

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_GUARD: &str = "guard";
