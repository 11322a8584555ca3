// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::AvailabilityService;
use notification_cell::models::messages;
use notification_cell::{NotificationService, NotificationSink, NotificationType};
use security_cell::ValidationService;
use shared_config::AppConfig;
use shared_database::{decode, encode, Collection, DocumentStore, Query, SortDirection};
use shared_models::auth::Credentials;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest};
use crate::services::conflict::ConflictDetectionService;
use crate::services::consistency::{doctor_lock_key, SchedulingLockService};

const REFERENCE_FIELD: &str = "appointments";

/// Aggregates whose `appointments` list indexes this appointment.
fn reference_targets(appointment: &Appointment) -> Vec<(Collection, Uuid)> {
    let mut targets = vec![
        (Collection::Doctors, appointment.doctor_id),
        (Collection::Patients, appointment.patient_id),
    ];
    if let Some(admin_id) = appointment.admin_id {
        targets.push((Collection::Admins, admin_id));
    }
    targets
}

pub struct BookingService {
    store: Arc<dyn DocumentStore>,
    availability: AvailabilityService,
    conflicts: ConflictDetectionService,
    locks: SchedulingLockService,
    notifier: Arc<dyn NotificationSink>,
}

impl BookingService {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), config.reference_timezone),
            conflicts: ConflictDetectionService::new(
                store.clone(),
                config.conflict_policy,
                Duration::minutes(config.appointment_duration_minutes),
            ),
            locks: SchedulingLockService::from_config(store.clone(), config),
            notifier: Arc::new(NotificationService::new(store.clone())),
            store,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    /// Books a slot for a patient with a doctor.
    ///
    /// The conflict check, the insert and the reference propagation run under
    /// the doctor's scheduling lock. A failed propagation is compensated and
    /// reported as a persistence failure. Notifications are best effort.
    #[instrument(skip(self, requester, request), fields(doctor_id = %request.doctor_id, patient_id = %request.patient_id))]
    pub async fn book(
        &self,
        requester: &Credentials,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let notes = ValidationService::require_text(&request.notes, "notes")?;

        self.ensure_exists(Collection::Doctors, request.doctor_id, AppointmentError::DoctorNotFound)
            .await?;
        self.ensure_exists(Collection::Patients, request.patient_id, AppointmentError::PatientNotFound)
            .await?;

        if !self
            .availability
            .is_available(request.doctor_id, request.scheduled_time)
            .await?
        {
            debug!("Doctor {} has no slot at {}", request.doctor_id, request.scheduled_time);
            return Err(AppointmentError::SlotUnavailable(
                "Doctor is not available at the requested time".to_string(),
            ));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            admin_id: requester.is_admin().then_some(requester.user_id),
            scheduled_time: request.scheduled_time,
            status: AppointmentStatus::Scheduled,
            notes,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        };

        let lock = self.locks.acquire(&doctor_lock_key(request.doctor_id)).await?;
        let created = self.create_and_propagate(appointment).await;
        self.locks.release(lock).await;
        let appointment = created?;

        info!(
            "Booked appointment {} with doctor {} for patient {} at {}",
            appointment.id, appointment.doctor_id, appointment.patient_id, appointment.scheduled_time
        );

        self.notifier
            .emit_best_effort(appointment.doctor_id, NotificationType::Appointment, messages::BOOKED_FOR_DOCTOR)
            .await;
        self.notifier
            .emit_best_effort(appointment.patient_id, NotificationType::Appointment, messages::CONFIRMED)
            .await;

        Ok(appointment)
    }

    async fn create_and_propagate(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        if self
            .conflicts
            .has_conflict(appointment.doctor_id, appointment.scheduled_time, None)
            .await?
        {
            return Err(AppointmentError::SlotUnavailable(
                "The requested time slot is already booked".to_string(),
            ));
        }

        let stored = self
            .store
            .insert(Collection::Appointments, encode(&appointment)?)
            .await?;
        let appointment: Appointment = decode(stored)?;

        let appointment_id = appointment.id.to_string();
        let mut applied = Vec::new();
        for (collection, owner_id) in reference_targets(&appointment) {
            let pushed = self
                .store
                .push_reference(collection, &owner_id.to_string(), REFERENCE_FIELD, &appointment_id)
                .await;
            match pushed {
                Ok(true) => applied.push((collection, owner_id)),
                Ok(false) => {
                    error!("Cannot index appointment {}: {} {} is missing", appointment.id, collection, owner_id);
                    self.compensate(&appointment, &applied).await;
                    return Err(AppointmentError::PropagationFailed(appointment.id));
                }
                Err(e) => {
                    error!("Failed to index appointment {} on {} {}: {}", appointment.id, collection, owner_id, e);
                    self.compensate(&appointment, &applied).await;
                    return Err(AppointmentError::PropagationFailed(appointment.id));
                }
            }
        }

        Ok(appointment)
    }

    /// Undoes a partially propagated booking.
    async fn compensate(&self, appointment: &Appointment, applied: &[(Collection, Uuid)]) {
        let appointment_id = appointment.id.to_string();
        for (collection, owner_id) in applied {
            if let Err(e) = self
                .store
                .pull_reference(*collection, &owner_id.to_string(), REFERENCE_FIELD, &appointment_id)
                .await
            {
                error!("Compensation left {} on {} {}: {}", appointment.id, collection, owner_id, e);
            }
        }

        match self
            .store
            .delete(Collection::Appointments, &appointment_id, &Query::new())
            .await
        {
            Ok(_) => warn!("Rolled back appointment {}", appointment.id),
            Err(e) => error!("Compensation failed to remove appointment {}: {}", appointment.id, e),
        }
    }

    async fn ensure_exists(
        &self,
        collection: Collection,
        id: Uuid,
        missing: AppointmentError,
    ) -> Result<(), AppointmentError> {
        match self.store.get(collection, &id.to_string()).await? {
            Some(_) => Ok(()),
            None => Err(missing),
        }
    }

    // ==============================================================================
    // READS
    // ==============================================================================

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let row = self
            .store
            .get(Collection::Appointments, &appointment_id.to_string())
            .await?
            .ok_or(AppointmentError::NotFound)?;
        Ok(decode(row)?)
    }

    pub async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_by("doctor_id", doctor_id).await
    }

    pub async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_by("patient_id", patient_id).await
    }

    async fn list_by(&self, field: &str, owner_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let query = Query::new()
            .eq(field, owner_id)
            .order_by("scheduled_time", SortDirection::Asc);

        let appointments = self
            .store
            .find(Collection::Appointments, &query)
            .await?
            .into_iter()
            .map(decode::<Appointment>)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Found {} appointments for {} {}", appointments.len(), field, owner_id);
        Ok(appointments)
    }

    // ==============================================================================
    // DELETION
    // ==============================================================================

    /// Retracts the appointment from every aggregate indexing it, deletes it
    /// and tells the patient. A failed delete re-applies the retractions.
    #[instrument(skip(self))]
    pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;
        let id = appointment_id.to_string();

        let mut retracted = Vec::new();
        for (collection, owner_id) in reference_targets(&appointment) {
            match self
                .store
                .pull_reference(collection, &owner_id.to_string(), REFERENCE_FIELD, &id)
                .await
            {
                Ok(_) => retracted.push((collection, owner_id)),
                Err(e) => {
                    self.restore_references(&id, &retracted).await;
                    return Err(e.into());
                }
            }
        }

        match self.store.delete(Collection::Appointments, &id, &Query::new()).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Appointment {} vanished before it could be deleted", appointment_id);
                return Err(AppointmentError::NotFound);
            }
            Err(e) => {
                self.restore_references(&id, &retracted).await;
                return Err(e.into());
            }
        }

        info!("Deleted appointment {}", appointment_id);
        self.notifier
            .emit_best_effort(appointment.patient_id, NotificationType::Appointment, messages::DELETED)
            .await;
        Ok(())
    }

    async fn restore_references(&self, appointment_id: &str, retracted: &[(Collection, Uuid)]) {
        for (collection, owner_id) in retracted {
            if let Err(e) = self
                .store
                .push_reference(*collection, &owner_id.to_string(), REFERENCE_FIELD, appointment_id)
                .await
            {
                error!("Failed to restore {} on {} {}: {}", appointment_id, collection, owner_id, e);
            }
        }
    }
}
