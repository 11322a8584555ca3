use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use security_cell::ValidationIssue;
use shared_database::StoreError;
use shared_models::error::AppError;

/// Admin account. `appointments` is the index of bookings this admin made
/// and is maintained by the booking flow, never written through this cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub managed_doctors: Vec<Uuid>,
    #[serde(default)]
    pub managed_patients: Vec<Uuid>,
    #[serde(default)]
    pub appointments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdminRequest {
    /// Account id of the admin; generated when absent.
    pub id: Option<Uuid>,
    pub full_name: Option<String>,
    #[serde(default, alias = "managedDoctors")]
    pub managed_doctors: Vec<Uuid>,
    #[serde(default, alias = "managedPatients")]
    pub managed_patients: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAdminRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, alias = "managedDoctors", skip_serializing_if = "Option::is_none")]
    pub managed_doctors: Option<Vec<Uuid>>,
    #[serde(default, alias = "managedPatients", skip_serializing_if = "Option::is_none")]
    pub managed_patients: Option<Vec<Uuid>>,
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Admin not found")]
    NotFound,

    #[error("{kind} ID {id} does not exist")]
    UnknownAccount { kind: &'static str, id: Uuid },

    #[error(transparent)]
    Validation(#[from] ValidationIssue),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::NotFound => AppError::NotFound("Admin not found".to_string()),
            AdminError::UnknownAccount { .. } => AppError::Validation(err.to_string()),
            AdminError::Validation(issue) => issue.into(),
            AdminError::Store(e) => e.into(),
        }
    }
}
