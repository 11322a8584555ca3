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

use crate::models::{CreateDoctorRequest, UpdateAvailabilityRequest};
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(&credentials, ResourceType::Doctor, Action::List, &ResourceOwners::none())?;
    let service = DoctorService::new(state.store().await?);

    let doctors = service.list_doctors().await?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Doctor,
        Action::Read,
        &ResourceOwners::doctor(doctor_id),
    )?;
    let service = DoctorService::new(state.store().await?);

    let doctor = service.get_doctor(doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_doctor_patients(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Doctor,
        Action::ListPatients,
        &ResourceOwners::doctor(doctor_id),
    )?;
    let service = DoctorService::new(state.store().await?);

    let roster = service.list_patients(doctor_id).await?;

    Ok(Json(json!(roster)))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    clinic_capabilities().authorize(&credentials, ResourceType::Doctor, Action::Create, &ResourceOwners::none())?;
    let service = DoctorService::new(state.store().await?);

    let doctor = service.create_doctor(request).await?;

    Ok((StatusCode::CREATED, Json(json!(doctor))))
}

#[axum::debug_handler]
pub async fn update_doctor_availability(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Doctor,
        Action::Update,
        &ResourceOwners::doctor(doctor_id),
    )?;
    let service = DoctorService::new(state.store().await?);

    let doctor = service.update_availability(doctor_id, request).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Doctor,
        Action::Delete,
        &ResourceOwners::doctor(doctor_id),
    )?;
    let service = DoctorService::new(state.store().await?);

    service.delete_doctor(doctor_id).await?;

    Ok(Json(json!({ "message": "Doctor deleted" })))
}
