//! Handlers for the `/shifts` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use shiftguard_core::error::CoreError;
use shiftguard_core::types::DbId;
use shiftguard_db::models::shift::{CreateShift, Shift};
use shiftguard_engine::orchestrator::RaiseOutcome;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/shifts
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateShift>,
) -> AppResult<(StatusCode, Json<DataResponse<Shift>>)> {
    let shift = state.engine.shifts.create_shift(&input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: shift })))
}

/// GET /api/v1/shifts/{id}
///
/// Visible to admins, the assigned guard and the replacement guard.
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(shift_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Shift>>> {
    let shift = state.engine.shifts.get_shift(shift_id).await?;
    let involved =
        shift.guard_id == auth.guard_id || shift.replacement_guard_id == Some(auth.guard_id);
    if !involved && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not assigned to this shift".into(),
        )));
    }
    Ok(Json(DataResponse { data: shift }))
}

/// POST /api/v1/shifts/{id}/replacement
///
/// Raise the replacement for one overdue shift. Returns 201 when this call
/// created the offer and 200 with the existing offer otherwise.
pub async fn raise_replacement(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(shift_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<RaiseOutcome>>)> {
    let outcome = state
        .engine
        .replacements
        .raise_replacement(shift_id, Utc::now())
        .await?;
    let status = if outcome.is_new() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: outcome })))
}
