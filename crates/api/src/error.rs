use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shiftguard_core::error::CoreError;
use shiftguard_engine::{EngineError, StoreError};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for auth and request validation, [`EngineError`] for
/// engine outcomes, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Engine outcomes ---
            AppError::Engine(err) => classify_engine_error(err),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Map an engine outcome to an HTTP status and stable error code.
fn classify_engine_error(err: &EngineError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
        EngineError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE", message),
        EngineError::AlreadyResolved { .. } => {
            (StatusCode::CONFLICT, "ALREADY_RESOLVED", message)
        }
        EngineError::Expired { .. } => (StatusCode::GONE, "EXPIRED", message),
        EngineError::NotACandidate { .. } => (StatusCode::FORBIDDEN, "NOT_A_CANDIDATE", message),
        EngineError::DuplicateCheckIn { .. } => {
            (StatusCode::CONFLICT, "DUPLICATE_CHECK_IN", message)
        }
        EngineError::AlreadyCheckedOut { .. } => {
            (StatusCode::CONFLICT, "ALREADY_CHECKED_OUT", message)
        }
        EngineError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        EngineError::Store(StoreError::Database(db)) => classify_sqlx_error(db),
        EngineError::Store(StoreError::Unavailable(msg)) => {
            tracing::error!(error = %msg, "Roster store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "The roster store is unavailable".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some(shiftguard_db::UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_and_code(err: EngineError) -> (StatusCode, &'static str) {
        let (status, code, _) = classify_engine_error(&err);
        (status, code)
    }

    #[test]
    fn engine_outcomes_map_to_stable_codes() {
        assert_eq!(
            status_and_code(EngineError::NotFound { entity: "shift", id: 1 }),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            status_and_code(EngineError::AlreadyResolved { request_id: 1 }),
            (StatusCode::CONFLICT, "ALREADY_RESOLVED")
        );
        assert_eq!(
            status_and_code(EngineError::Expired { request_id: 1 }),
            (StatusCode::GONE, "EXPIRED")
        );
        assert_eq!(
            status_and_code(EngineError::NotACandidate { request_id: 1, guard_id: 2 }),
            (StatusCode::FORBIDDEN, "NOT_A_CANDIDATE")
        );
        assert_eq!(
            status_and_code(EngineError::DuplicateCheckIn { guard_id: 1, shift_id: 2 }),
            (StatusCode::CONFLICT, "DUPLICATE_CHECK_IN")
        );
        assert_eq!(
            status_and_code(EngineError::InvalidState("no".into())),
            (StatusCode::CONFLICT, "INVALID_STATE")
        );
    }

    #[test]
    fn unavailable_store_hides_details() {
        let (status, code, message) = classify_engine_error(&EngineError::Store(
            StoreError::Unavailable("lock poisoned".into()),
        ));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "STORE_UNAVAILABLE");
        assert!(!message.contains("poisoned"));
    }

    #[test]
    fn row_not_found_is_404() {
        let (status, code, _) = classify_sqlx_error(&sqlx::Error::RowNotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }
}
