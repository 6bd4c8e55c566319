//! Route definitions for the `/replacements` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::replacements;
use crate::state::AppState;

/// Routes mounted at `/replacements`.
///
/// ```text
/// GET    /                      -> list (admin, ?status=&limit=)
/// POST   /expire                -> expire (admin)
/// GET    /{id}                  -> get_by_id
/// POST   /{id}/accept           -> accept
/// POST   /{id}/decline          -> decline
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(replacements::list))
        .route("/expire", post(replacements::expire))
        .route("/{id}", get(replacements::get_by_id))
        .route("/{id}/accept", post(replacements::accept))
        .route("/{id}/decline", post(replacements::decline))
}
