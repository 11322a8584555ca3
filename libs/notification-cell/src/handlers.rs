use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Credentials;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::services::NotificationService;

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(state.store().await?);

    let notifications = service.list_for_user(credentials.user_id).await?;

    Ok(Json(json!(notifications)))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(state.store().await?);

    let notification = service.mark_read(&credentials, notification_id).await?;

    Ok(Json(json!(notification)))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(state.store().await?);

    let updated = service.mark_all_read(credentials.user_id).await?;

    Ok(Json(json!({
        "message": "All notifications marked as read",
        "updated": updated
    })))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(state.store().await?);

    service.delete(&credentials, notification_id).await?;

    Ok(Json(json!({ "message": "Notification deleted" })))
}
