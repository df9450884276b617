//! HTTP handlers for in-app notification endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::Notification;
use crate::services::NotificationService;
use crate::AppState;

#[derive(Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub marked: i64,
}

/// Notifications visible to the current user
pub async fn list_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<NotificationListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let service = NotificationService::new(state.db);
    let notifications = service
        .list_for_user(current_user.0.user_id, query.unread_only)
        .await?;
    Ok(Json(notifications))
}

/// Unread notification count
pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let service = NotificationService::new(state.db);
    let unread = service.unread_count(current_user.0.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// Mark one notification as read
pub async fn mark_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = NotificationService::new(state.db);
    service
        .mark_as_read(current_user.0.user_id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark all visible notifications as read
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let service = NotificationService::new(state.db);
    let marked = service.mark_all_as_read(current_user.0.user_id).await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
