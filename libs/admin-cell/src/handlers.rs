use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use security_cell::{clinic_capabilities, Action, ResourceOwners, ResourceType};
use shared_models::auth::Credentials;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{CreateAdminRequest, UpdateAdminRequest};
use crate::services::AdminService;

#[axum::debug_handler]
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Json(request): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    clinic_capabilities().authorize(&credentials, ResourceType::Admin, Action::Create, &ResourceOwners::none())?;
    let service = AdminService::new(state.store().await?);

    let admin = service.create_admin(request).await?;

    Ok((StatusCode::CREATED, Json(json!(admin))))
}

#[axum::debug_handler]
pub async fn list_admins(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(&credentials, ResourceType::Admin, Action::List, &ResourceOwners::none())?;
    let service = AdminService::new(state.store().await?);

    let admins = service.list_admins().await?;

    Ok(Json(json!(admins)))
}

#[axum::debug_handler]
pub async fn get_admin(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(admin_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Admin,
        Action::Read,
        &ResourceOwners::user(admin_id),
    )?;
    let service = AdminService::new(state.store().await?);

    let admin = service.get_admin(admin_id).await?;

    Ok(Json(json!(admin)))
}

#[axum::debug_handler]
pub async fn update_admin(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(admin_id): Path<Uuid>,
    Json(request): Json<UpdateAdminRequest>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Admin,
        Action::Update,
        &ResourceOwners::user(admin_id),
    )?;
    let service = AdminService::new(state.store().await?);

    let admin = service.update_admin(admin_id, request).await?;

    Ok(Json(json!(admin)))
}

#[axum::debug_handler]
pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(admin_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Admin,
        Action::Delete,
        &ResourceOwners::user(admin_id),
    )?;
    let service = AdminService::new(state.store().await?);

    service.delete_admin(admin_id).await?;

    Ok(Json(json!({ "message": "Admin deleted" })))
}
