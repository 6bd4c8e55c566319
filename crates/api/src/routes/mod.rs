pub mod attendance;
pub mod guards;
pub mod health;
pub mod notifications;
pub mod replacements;
pub mod shifts;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /guards                          directory, availability, offers
/// /shifts                          scheduling, on-demand replacement
/// /attendance                      check-in / check-out
/// /replacements                    offers: list, get, accept, decline, expire
/// /no-shows/detect                 run detection now (admin)
/// /notifications                   caller's inbox
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/guards", guards::router())
        .nest("/shifts", shifts::router())
        .nest("/attendance", attendance::router())
        .nest("/replacements", replacements::router())
        .route(
            "/no-shows/detect",
            post(handlers::replacements::detect_no_shows),
        )
        .nest("/notifications", notifications::router())
}
