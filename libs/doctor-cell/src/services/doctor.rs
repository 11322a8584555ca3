use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use security_cell::ValidationService;
use shared_database::{decode, encode, Collection, DocumentStore, Query, SortDirection};

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, RosterAppointment, RosterEntry, UpdateAvailabilityRequest,
};
use crate::services::availability::{merge_availability, validate_weekly_availability};

pub struct DoctorService {
    store: Arc<dyn DocumentStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        let query = Query::new().order_by("created_at", SortDirection::Asc);
        let rows = self.store.find(Collection::Doctors, &query).await?;

        let doctors = rows
            .into_iter()
            .map(decode::<Doctor>)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Listed {} doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let row = self
            .store
            .get(Collection::Doctors, &doctor_id.to_string())
            .await?
            .ok_or(DoctorError::NotFound)?;
        Ok(decode(row)?)
    }

    /// Patients the doctor has appointments with, one entry per appointment
    /// in time order.
    pub async fn list_patients(&self, doctor_id: Uuid) -> Result<Vec<RosterEntry>, DoctorError> {
        self.get_doctor(doctor_id).await?;

        let query = Query::new()
            .eq("doctor_id", doctor_id)
            .order_by("scheduled_time", SortDirection::Asc);
        let appointments = self
            .store
            .find(Collection::Appointments, &query)
            .await?
            .into_iter()
            .map(decode::<RosterAppointment>)
            .collect::<Result<Vec<_>, _>>()?;

        let mut roster = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            match self
                .store
                .get(Collection::Patients, &appointment.patient_id.to_string())
                .await?
            {
                Some(Value::Object(patient)) => roster.push(RosterEntry {
                    patient,
                    appointment_id: appointment.id,
                    scheduled_time: appointment.scheduled_time,
                    status: appointment.status,
                    notes: appointment.notes,
                }),
                _ => warn!(
                    "Appointment {} references missing patient {}",
                    appointment.id, appointment.patient_id
                ),
            }
        }
        debug!("Doctor {} has {} roster entries", doctor_id, roster.len());
        Ok(roster)
    }

    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        let specialty = ValidationService::require_text(&request.specialty, "specialty")?;
        validate_weekly_availability(&request.availability)?;

        let now = Utc::now();
        let doctor = Doctor {
            id: request.id.unwrap_or_else(Uuid::new_v4),
            full_name: request.full_name,
            specialty,
            availability: request.availability,
            appointments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(Collection::Doctors, encode(&doctor)?).await?;
        info!("Created doctor {}", doctor.id);
        Ok(decode(stored)?)
    }

    /// Replaces the slots of days already on file and appends new days.
    pub async fn update_availability(
        &self,
        doctor_id: Uuid,
        request: UpdateAvailabilityRequest,
    ) -> Result<Doctor, DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;

        let merged = merge_availability(doctor.availability, request.availability);
        validate_weekly_availability(&merged)?;

        let patch = json!({
            "availability": merged,
            "updated_at": Utc::now(),
        });
        let updated = self
            .store
            .update(Collection::Doctors, &doctor_id.to_string(), patch, &Query::new())
            .await?
            .ok_or(DoctorError::NotFound)?;

        info!("Updated availability for doctor {}", doctor_id);
        Ok(decode(updated)?)
    }

    pub async fn delete_doctor(&self, doctor_id: Uuid) -> Result<(), DoctorError> {
        let deleted = self
            .store
            .delete(Collection::Doctors, &doctor_id.to_string(), &Query::new())
            .await?;
        if !deleted {
            return Err(DoctorError::NotFound);
        }
        info!("Deleted doctor {}", doctor_id);
        Ok(())
    }
}
