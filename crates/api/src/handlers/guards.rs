//! Handlers for the `/guards` resource: directory, availability and offers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shiftguard_core::types::DbId;
use shiftguard_db::models::availability::{AvailabilityEntry, SetAvailability};
use shiftguard_db::models::guard::{CreateGuard, Guard};
use shiftguard_db::models::replacement::ReplacementRequest;
use shiftguard_db::models::shift::Shift;
use shiftguard_engine::availability::AvailabilityStatus;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /guards/{id}/availability`.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

/// POST /api/v1/guards
pub async fn register(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateGuard>,
) -> AppResult<(StatusCode, Json<DataResponse<Guard>>)> {
    let guard = state.engine.shifts.register_guard(&input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: guard })))
}

/// GET /api/v1/guards/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(guard_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Guard>>> {
    auth.ensure_self_or_admin(guard_id)?;
    let guard = state.engine.shifts.get_guard(guard_id).await?;
    Ok(Json(DataResponse { data: guard }))
}

/// GET /api/v1/guards/{id}/shifts
pub async fn list_shifts(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(guard_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Shift>>>> {
    auth.ensure_self_or_admin(guard_id)?;
    let shifts = state.engine.shifts.list_for_guard(guard_id).await?;
    Ok(Json(DataResponse { data: shifts }))
}

/// PUT /api/v1/guards/{id}/availability
///
/// Last write wins for the guard and the UTC day of `date`.
pub async fn set_availability(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(guard_id): Path<DbId>,
    Json(input): Json<SetAvailability>,
) -> AppResult<Json<DataResponse<AvailabilityEntry>>> {
    auth.ensure_self_or_admin(guard_id)?;
    let entry = state
        .engine
        .availability
        .set_availability(
            guard_id,
            input.date,
            input.available,
            input.reason.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(DataResponse { data: entry }))
}

/// GET /api/v1/guards/{id}/availability?date=YYYY-MM-DD
pub async fn get_availability(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(guard_id): Path<DbId>,
    Query(params): Query<AvailabilityQuery>,
) -> AppResult<Json<DataResponse<AvailabilityStatus>>> {
    auth.ensure_self_or_admin(guard_id)?;
    let status = state.engine.availability.status(guard_id, params.date).await?;
    Ok(Json(DataResponse { data: status }))
}

/// GET /api/v1/guards/{id}/offers
///
/// Pending offers on which the guard has not yet declined.
pub async fn list_offers(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(guard_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ReplacementRequest>>>> {
    auth.ensure_self_or_admin(guard_id)?;
    let offers = state
        .engine
        .replacements
        .open_offers_for_guard(guard_id)
        .await?;
    Ok(Json(DataResponse { data: offers }))
}
