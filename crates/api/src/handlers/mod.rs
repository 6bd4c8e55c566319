pub mod attendance;
pub mod guards;
pub mod notifications;
pub mod replacements;
pub mod shifts;
