use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use security_cell::ValidationIssue;
use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Local `HH:MM` bounds of a recurring slot, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub day: DayOfWeek,
    #[serde(alias = "timeSlots", default)]
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub availability: Vec<DayAvailability>,
    #[serde(default)]
    pub appointments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment fields needed to build a doctor's patient roster.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterAppointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

/// A patient record annotated with the appointment that links it to the doctor.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub patient: Map<String, Value>,
    pub appointment_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub status: String,
    pub notes: String,
}

// Request DTOs

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    /// Account id of the doctor; generated when absent.
    pub id: Option<Uuid>,
    pub full_name: Option<String>,
    pub specialty: String,
    #[serde(default)]
    pub availability: Vec<DayAvailability>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub availability: Vec<DayAvailability>,
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationIssue),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::Validation(issue) => issue.into(),
            DoctorError::Store(e) => e.into(),
        }
    }
}
