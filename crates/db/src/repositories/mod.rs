//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod attendance_repo;
pub mod availability_repo;
pub mod event_repo;
pub mod guard_repo;
pub mod notification_repo;
pub mod replacement_repo;
pub mod shift_repo;

pub use attendance_repo::AttendanceRepo;
pub use availability_repo::AvailabilityRepo;
pub use event_repo::EventRepo;
pub use guard_repo::GuardRepo;
pub use notification_repo::NotificationRepo;
pub use replacement_repo::ReplacementRepo;
pub use shift_repo::ShiftRepo;
