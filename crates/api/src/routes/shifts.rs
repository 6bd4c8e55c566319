//! Route definitions for the `/shifts` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::shifts;
use crate::state::AppState;

/// Routes mounted at `/shifts`.
///
/// ```text
/// POST   /                      -> create (admin)
/// GET    /{id}                  -> get_by_id
/// POST   /{id}/replacement      -> raise_replacement (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(shifts::create))
        .route("/{id}", get(shifts::get_by_id))
        .route("/{id}/replacement", post(shifts::raise_replacement))
}
