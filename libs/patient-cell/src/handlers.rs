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

use crate::models::{CreatePatientRequest, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    clinic_capabilities().authorize(&credentials, ResourceType::Patient, Action::Create, &ResourceOwners::none())?;
    let service = PatientService::new(state.store().await?);

    let patient = service.create_patient(request).await?;

    Ok((StatusCode::CREATED, Json(json!(patient))))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(&credentials, ResourceType::Patient, Action::List, &ResourceOwners::none())?;
    let service = PatientService::new(state.store().await?);

    let patients = service.list_patients().await?;

    Ok(Json(json!(patients)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Patient,
        Action::Read,
        &ResourceOwners::patient(patient_id),
    )?;
    let service = PatientService::new(state.store().await?);

    let patient = service.get_patient(patient_id).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Patient,
        Action::Update,
        &ResourceOwners::patient(patient_id),
    )?;
    let service = PatientService::new(state.store().await?);

    let patient = service.update_patient(patient_id, request).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Patient,
        Action::Delete,
        &ResourceOwners::patient(patient_id),
    )?;
    let service = PatientService::new(state.store().await?);

    service.delete_patient(patient_id).await?;

    Ok(Json(json!({ "message": "Patient deleted" })))
}
