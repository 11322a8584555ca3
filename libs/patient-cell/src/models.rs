use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use security_cell::ValidationIssue;
use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    #[serde(rename = "Prefer not to say")]
    PreferNotToSay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub medical_history: Vec<MedicalHistoryEntry>,
    #[serde(default)]
    pub appointments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientRequest {
    /// Account id of the patient; generated when absent.
    pub id: Option<Uuid>,
    pub full_name: Option<String>,
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub medical_history: Vec<MedicalHistoryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<Vec<MedicalHistoryEntry>>,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationIssue),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::Validation(issue) => issue.into(),
            PatientError::Store(e) => e.into(),
        }
    }
}
