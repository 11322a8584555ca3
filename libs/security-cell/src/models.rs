// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

// =====================================================================================
// AUTHORIZATION MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Appointment,
    Doctor,
    Patient,
    Admin,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Create,
    Read,
    List,
    Update,
    Delete,
    ListPatients,
    SweepReminders,
    NotifyUnavailable,
}

/// Ids of the accounts a record belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOwners {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ResourceOwners {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn appointment(doctor_id: Uuid, patient_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            patient_id: Some(patient_id),
            user_id: None,
        }
    }

    pub fn doctor(doctor_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            ..Self::default()
        }
    }

    pub fn patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Access denied: {action:?} on {resource:?}")]
    Denied { resource: ResourceType, action: Action },
}

impl From<AuthorizationError> for AppError {
    fn from(err: AuthorizationError) -> Self {
        AppError::Forbidden(err.to_string())
    }
}

// =====================================================================================
// VALIDATION MODELS
// =====================================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be a time of day in HH:MM format, got '{value}'")]
    InvalidTimeOfDay { field: String, value: String },

    #[error("{field} exceeds maximum length of {max_length} (got {actual_length})")]
    ExceedsMaxLength {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("{field}: {detail}")]
    InvalidRange { field: String, detail: String },
}

impl From<ValidationIssue> for AppError {
    fn from(issue: ValidationIssue) -> Self {
        AppError::Validation(issue.to_string())
    }
}
