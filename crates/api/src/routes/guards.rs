//! Route definitions for the `/guards` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::guards;
use crate::state::AppState;

/// Routes mounted at `/guards`.
///
/// ```text
/// POST   /                      -> register (admin)
/// GET    /{id}                  -> get_by_id
/// GET    /{id}/shifts           -> list_shifts
/// GET    /{id}/availability     -> get_availability (?date=YYYY-MM-DD)
/// PUT    /{id}/availability     -> set_availability
/// GET    /{id}/offers           -> list_offers
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(guards::register))
        .route("/{id}", get(guards::get_by_id))
        .route("/{id}/shifts", get(guards::list_shifts))
        .route(
            "/{id}/availability",
            get(guards::get_availability).put(guards::set_availability),
        )
        .route("/{id}/offers", get(guards::list_offers))
}
