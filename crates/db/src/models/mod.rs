//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts coming from the API layer
//! - Plain insert structs used by the engine

pub mod attendance;
pub mod availability;
pub mod event;
pub mod guard;
pub mod notification;
pub mod replacement;
pub mod shift;
