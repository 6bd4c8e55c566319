//! Route definitions for the `/attendance` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::attendance;
use crate::state::AppState;

/// Routes mounted at `/attendance`.
///
/// ```text
/// POST   /check-in              -> check_in
/// POST   /{id}/check-out        -> check_out
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-in", post(attendance::check_in))
        .route("/{id}/check-out", post(attendance::check_out))
}
