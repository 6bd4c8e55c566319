//! Handlers for the caller's in-app notifications.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use shiftguard_core::types::DbId;
use shiftguard_db::models::notification::Notification;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50.
    pub limit: Option<i64>,
}

/// GET /api/v1/notifications
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let notifications = state
        .engine
        .inbox
        .list(
            auth.guard_id,
            params.unread_only.unwrap_or(false),
            params.limit,
        )
        .await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// 404 if the notification does not belong to the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let notification = state
        .engine
        .inbox
        .mark_read(notification_id, auth.guard_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: notification }))
}
