//! Engine error taxonomy.
//!
//! Every operation returns one of these typed outcomes; store failures are
//! wrapped in [`EngineError::Store`] and propagated, never swallowed.

use shiftguard_core::error::CoreError;
use shiftguard_core::types::DbId;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The shift or request is in a status incompatible with the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The replacement request is no longer pending.
    #[error("Replacement request {request_id} is already resolved")]
    AlreadyResolved { request_id: DbId },

    /// The offer window passed (whether or not the sweep has run).
    #[error("Replacement request {request_id} has expired")]
    Expired { request_id: DbId },

    #[error("Guard {guard_id} is not a candidate for replacement request {request_id}")]
    NotACandidate { request_id: DbId, guard_id: DbId },

    #[error("Guard {guard_id} already has an open check-in (shift {shift_id})")]
    DuplicateCheckIn { guard_id: DbId, shift_id: DbId },

    #[error("Attendance record {attendance_id} is already checked out")]
    AlreadyCheckedOut { attendance_id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            CoreError::Validation(msg) => EngineError::Validation(msg),
            CoreError::Conflict(msg) => EngineError::InvalidState(msg),
            other => EngineError::InvalidState(other.to_string()),
        }
    }
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: DbId) -> Self {
        EngineError::NotFound { entity, id }
    }
}
