//! Route definitions for the `/notifications` resource.
//!
//! All endpoints act on the authenticated caller's inbox.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                      -> list (?unread_only=&limit=)
/// POST   /{id}/read             -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list))
        .route("/{id}/read", post(notifications::mark_read))
}
