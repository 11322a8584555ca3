// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use security_cell::{clinic_capabilities, Action, ResourceOwners, ResourceType};
use shared_models::auth::Credentials;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{Appointment, AppointmentPatch, BookAppointmentRequest, DoctorUnavailableRequest};
use crate::services::{AppointmentLifecycleService, BatchSweepService, BookingService};

fn owners_of(appointment: &Appointment) -> ResourceOwners {
    ResourceOwners::appointment(appointment.doctor_id, appointment.patient_id)
}

// ==============================================================================
// BOOKING & READS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::Create,
        &ResourceOwners::appointment(request.doctor_id, request.patient_id),
    )?;
    let service = BookingService::new(state.store().await?, &state.config);

    let appointment = service.book(&credentials, request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::List,
        &ResourceOwners::doctor(doctor_id),
    )?;
    let service = BookingService::new(state.store().await?, &state.config);

    let appointments = service.list_for_doctor(doctor_id).await?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::List,
        &ResourceOwners::patient(patient_id),
    )?;
    let service = BookingService::new(state.store().await?, &state.config);

    let appointments = service.list_for_patient(patient_id).await?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(state.store().await?, &state.config);

    let appointment = service.get_appointment(appointment_id).await?;
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::Read,
        &owners_of(&appointment),
    )?;

    Ok(Json(json!(appointment)))
}

// ==============================================================================
// MUTATIONS
// ==============================================================================

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(appointment_id): Path<Uuid>,
    Json(patch): Json<AppointmentPatch>,
) -> Result<Json<Value>, AppError> {
    let store = state.store().await?;

    let current = BookingService::new(store.clone(), &state.config)
        .get_appointment(appointment_id)
        .await?;
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::Update,
        &owners_of(&current),
    )?;

    let appointment = AppointmentLifecycleService::new(store, &state.config)
        .apply_update(appointment_id, patch)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(state.store().await?, &state.config);

    let appointment = service.get_appointment(appointment_id).await?;
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::Delete,
        &owners_of(&appointment),
    )?;

    service.delete_appointment(appointment_id).await?;

    Ok(Json(json!({ "message": "Appointment deleted" })))
}

// ==============================================================================
// SWEEPS
// ==============================================================================

#[axum::debug_handler]
pub async fn sweep_reminders(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::SweepReminders,
        &ResourceOwners::none(),
    )?;
    let service = BatchSweepService::new(state.store().await?, &state.config);

    let sent = service.sweep_reminders(Utc::now()).await?;

    Ok(Json(json!({ "sent": sent })))
}

#[axum::debug_handler]
pub async fn doctor_unavailable(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Json(request): Json<DoctorUnavailableRequest>,
) -> Result<Json<Value>, AppError> {
    clinic_capabilities().authorize(
        &credentials,
        ResourceType::Appointment,
        Action::NotifyUnavailable,
        &ResourceOwners::doctor(request.doctor_id),
    )?;
    let service = BatchSweepService::new(state.store().await?, &state.config);

    let notified = service
        .notify_unavailability(request.doctor_id, request.start, request.end)
        .await?;

    Ok(Json(json!({ "notified": notified })))
}
