use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::DoctorError;
use notification_cell::models::messages;
use notification_cell::NotificationType;
use security_cell::ValidationIssue;
use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "Scheduled"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    /// Present only when an admin made the booking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<Uuid>,
    pub scheduled_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    /// Set once the reminder for this appointment has been claimed.
    #[serde(default)]
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(alias = "doctorId")]
    pub doctor_id: Uuid,
    #[serde(alias = "patientId")]
    pub patient_id: Uuid,
    #[serde(alias = "scheduledTime")]
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

/// Partial update of an appointment; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, alias = "scheduledTime", skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.scheduled_time.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorUnavailableRequest {
    #[serde(alias = "doctorId")]
    pub doctor_id: Uuid,
    #[serde(alias = "startTime")]
    pub start: DateTime<Utc>,
    #[serde(alias = "endTime")]
    pub end: DateTime<Utc>,
}

// ==============================================================================
// LIFECYCLE EVENTS
// ==============================================================================

/// Patient-facing consequence of an appointment update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Cancelled,
    NotesUpdated,
    Rescheduled,
    Completed,
}

impl LifecycleEvent {
    pub fn message(&self) -> &'static str {
        match self {
            LifecycleEvent::Cancelled => messages::CANCELLED,
            LifecycleEvent::NotesUpdated => messages::NOTES_UPDATED,
            LifecycleEvent::Rescheduled => messages::RESCHEDULED,
            LifecycleEvent::Completed => messages::COMPLETED,
        }
    }

    pub fn kind(&self) -> NotificationType {
        match self {
            LifecycleEvent::NotesUpdated => NotificationType::Update,
            _ => NotificationType::Appointment,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("{0}")]
    SlotUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Another scheduling change for this doctor is in progress")]
    SchedulingBusy,

    #[error("Appointment was changed by another request; reload and retry")]
    Modified,

    #[error("Failed to propagate appointment {0}")]
    PropagationFailed(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationIssue> for AppointmentError {
    fn from(issue: ValidationIssue) -> Self {
        AppointmentError::Validation(issue.to_string())
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppointmentError::DoctorNotFound,
            DoctorError::Validation(issue) => issue.into(),
            DoctorError::Store(e) => AppointmentError::Store(e),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PatientNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SlotUnavailable(msg) => AppError::SlotUnavailable(msg),
            AppointmentError::Validation(msg) => AppError::Validation(msg),
            AppointmentError::SchedulingBusy | AppointmentError::Modified => AppError::Conflict(err.to_string()),
            AppointmentError::PropagationFailed(_) => AppError::Persistence("An error occurred".to_string()),
            AppointmentError::Store(e) => e.into(),
        }
    }
}
