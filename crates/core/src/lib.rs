//! Shiftguard domain core.
//!
//! Pure, storage-agnostic building blocks shared by the persistence layer,
//! the replacement engine, the API server and the worker. This crate has no
//! internal dependencies and performs no I/O; every time-sensitive function
//! takes `now` as an argument.

pub mod availability;
pub mod error;
pub mod geo;
pub mod no_show;
pub mod policy;
pub mod replacement;
pub mod roles;
pub mod scoring;
pub mod shift;
pub mod status;
pub mod types;
