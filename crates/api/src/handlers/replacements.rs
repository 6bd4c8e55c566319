//! Handlers for replacement requests and no-show detection.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use shiftguard_core::error::CoreError;
use shiftguard_core::status::ReplacementStatus;
use shiftguard_core::types::DbId;
use shiftguard_db::models::replacement::{ReplacementOffer, ReplacementRequest};
use shiftguard_engine::orchestrator::DeclineOutcome;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /replacements`.
#[derive(Debug, Deserialize)]
pub struct ReplacementQuery {
    /// `pending`, `accepted`, `declined` or `expired`.
    pub status: Option<ReplacementStatus>,
    pub limit: Option<i64>,
}

/// GET /api/v1/replacements
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ReplacementQuery>,
) -> AppResult<Json<DataResponse<Vec<ReplacementRequest>>>> {
    let requests = state
        .engine
        .replacements
        .list(params.status, params.limit)
        .await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/replacements/{id}
///
/// Visible to admins, the absent guard and every listed candidate.
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReplacementOffer>>> {
    let offer = state.engine.replacements.get_offer(request_id).await?;
    let involved = offer.request.original_guard_id == auth.guard_id
        || offer.candidate(auth.guard_id).is_some();
    if !involved && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not a party to this replacement request".into(),
        )));
    }
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/replacements/{id}/accept
///
/// Exactly one candidate wins; everyone else gets 409 `ALREADY_RESOLVED`.
pub async fn accept(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReplacementRequest>>> {
    let request = state
        .engine
        .replacements
        .accept(request_id, auth.guard_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/replacements/{id}/decline
pub async fn decline(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeclineOutcome>>> {
    let outcome = state
        .engine
        .replacements
        .decline(request_id, auth.guard_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/replacements/expire
pub async fn expire(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ReplacementRequest>>>> {
    let expired = state.engine.replacements.expire_stale(Utc::now()).await?;
    Ok(Json(DataResponse { data: expired }))
}

/// POST /api/v1/no-shows/detect
///
/// Returns only the offers this call raised.
pub async fn detect_no_shows(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ReplacementOffer>>>> {
    let raised = state
        .engine
        .replacements
        .detect_and_raise(Utc::now())
        .await?;
    Ok(Json(DataResponse { data: raised }))
}
