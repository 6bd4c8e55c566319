//! Handlers for the `/attendance` resource.
//!
//! The caller always checks in as themselves; the guard id comes from the
//! bearer token, never the body.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::types::DbId;
use shiftguard_db::models::attendance::AttendanceRecord;
use shiftguard_engine::attendance::CheckOutOutcome;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /attendance/check-in`.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub shift_id: DbId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// POST /api/v1/attendance/check-in
pub async fn check_in(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CheckInRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AttendanceRecord>>)> {
    if input.latitude.is_some() != input.longitude.is_some() {
        return Err(AppError::BadRequest(
            "latitude and longitude must be given together".into(),
        ));
    }
    let location = GeoPoint::from_parts(input.latitude, input.longitude);

    let record = state
        .engine
        .attendance
        .check_in(auth.guard_id, input.shift_id, location, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// POST /api/v1/attendance/{id}/check-out
pub async fn check_out(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(attendance_id): Path<DbId>,
) -> AppResult<Json<DataResponse<CheckOutOutcome>>> {
    let record = state.engine.attendance.get(attendance_id).await?;
    auth.ensure_self_or_admin(record.guard_id)?;

    let outcome = state
        .engine
        .attendance
        .check_out(attendance_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}
