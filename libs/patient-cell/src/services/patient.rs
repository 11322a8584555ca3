use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use security_cell::{ValidationIssue, ValidationService};
use shared_database::{decode, encode, Collection, DocumentStore, Query, SortDirection};

use crate::models::{CreatePatientRequest, MedicalHistoryEntry, Patient, PatientError, UpdatePatientRequest};

const MAX_AGE: u32 = 150;

pub struct PatientService {
    store: Arc<dyn DocumentStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        validate_age(request.age)?;
        validate_history(&request.medical_history)?;

        let now = Utc::now();
        let patient = Patient {
            id: request.id.unwrap_or_else(Uuid::new_v4),
            full_name: request.full_name,
            age: request.age,
            gender: request.gender,
            medical_history: request.medical_history,
            appointments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(Collection::Patients, encode(&patient)?).await?;
        info!("Created patient {}", patient.id);
        Ok(decode(stored)?)
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        let query = Query::new().order_by("created_at", SortDirection::Asc);
        let patients = self
            .store
            .find(Collection::Patients, &query)
            .await?
            .into_iter()
            .map(decode::<Patient>)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Listed {} patients", patients.len());
        Ok(patients)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        let row = self
            .store
            .get(Collection::Patients, &patient_id.to_string())
            .await?
            .ok_or(PatientError::NotFound)?;
        Ok(decode(row)?)
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        if let Some(age) = request.age {
            validate_age(age)?;
        }
        if let Some(history) = &request.medical_history {
            validate_history(history)?;
        }

        let mut patch = encode(&request)?;
        if let Value::Object(fields) = &mut patch {
            fields.insert("updated_at".to_string(), encode(&Utc::now())?);
        }

        let updated = self
            .store
            .update(Collection::Patients, &patient_id.to_string(), patch, &Query::new())
            .await?
            .ok_or(PatientError::NotFound)?;

        info!("Updated patient {}", patient_id);
        Ok(decode(updated)?)
    }

    pub async fn delete_patient(&self, patient_id: Uuid) -> Result<(), PatientError> {
        let deleted = self
            .store
            .delete(Collection::Patients, &patient_id.to_string(), &Query::new())
            .await?;
        if !deleted {
            return Err(PatientError::NotFound);
        }
        info!("Deleted patient {}", patient_id);
        Ok(())
    }
}

fn validate_age(age: u32) -> Result<(), ValidationIssue> {
    if age > MAX_AGE {
        return Err(ValidationIssue::InvalidRange {
            field: "age".to_string(),
            detail: format!("must be at most {}", MAX_AGE),
        });
    }
    Ok(())
}

fn validate_history(history: &[MedicalHistoryEntry]) -> Result<(), ValidationIssue> {
    for entry in history {
        ValidationService::require_text(&entry.condition, "medicalHistory.condition")?;
        ValidationService::require_text(&entry.treatment, "medicalHistory.treatment")?;
    }
    Ok(())
}
