// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::AvailabilityService;
use notification_cell::{NotificationService, NotificationSink};
use security_cell::ValidationService;
use shared_config::AppConfig;
use shared_database::{decode, encode, Collection, DocumentStore, Query};

use crate::models::{Appointment, AppointmentError, AppointmentPatch, AppointmentStatus, LifecycleEvent};
use crate::services::conflict::ConflictDetectionService;
use crate::services::consistency::{doctor_lock_key, SchedulingLockService};

/// Notifications owed to the patient for moving `prior` through `patch`.
/// Each check is independent, so one update can raise several events.
pub fn transition_events(prior: &Appointment, patch: &AppointmentPatch) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();

    if patch.status == Some(AppointmentStatus::Cancelled) && prior.status != AppointmentStatus::Cancelled {
        events.push(LifecycleEvent::Cancelled);
    }
    if patch.notes.as_deref().is_some_and(|notes| notes != prior.notes) {
        events.push(LifecycleEvent::NotesUpdated);
    }
    if patch.scheduled_time.is_some_and(|time| time != prior.scheduled_time) {
        events.push(LifecycleEvent::Rescheduled);
    }
    if patch.status == Some(AppointmentStatus::Completed) && prior.status != AppointmentStatus::Completed {
        events.push(LifecycleEvent::Completed);
    }

    events
}

pub struct AppointmentLifecycleService {
    store: Arc<dyn DocumentStore>,
    availability: AvailabilityService,
    conflicts: ConflictDetectionService,
    locks: SchedulingLockService,
    notifier: Arc<dyn NotificationSink>,
}

impl AppointmentLifecycleService {
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

    /// Applies `patch` and notifies the patient of each transition it causes.
    ///
    /// An update that leaves the appointment holding a slot it did not hold
    /// before (a new `scheduled_time`, or reviving a cancelled appointment)
    /// must pass the same availability and conflict checks as a booking.
    /// A new time re-arms the reminder. Writes are guarded on the
    /// `updated_at` read here, so the events match the state they replace.
    #[instrument(skip(self, patch))]
    pub async fn apply_update(
        &self,
        appointment_id: Uuid,
        mut patch: AppointmentPatch,
    ) -> Result<Appointment, AppointmentError> {
        if let Some(notes) = patch.notes.as_deref() {
            patch.notes = Some(ValidationService::require_text(notes, "notes")?);
        }

        let row = self
            .store
            .get(Collection::Appointments, &appointment_id.to_string())
            .await?
            .ok_or(AppointmentError::NotFound)?;
        let prior: Appointment = decode(row)?;

        if patch.is_empty() {
            debug!("Empty update for appointment {}", appointment_id);
            return Ok(prior);
        }

        let events = transition_events(&prior, &patch);
        let desired = patch.scheduled_time.unwrap_or(prior.scheduled_time);
        let moved = desired != prior.scheduled_time;
        let status = patch.status.unwrap_or(prior.status);
        let revived = prior.status == AppointmentStatus::Cancelled && status != AppointmentStatus::Cancelled;

        // Cancelled appointments occupy no slot.
        let updated = if status != AppointmentStatus::Cancelled && (moved || revived) {
            self.claim_slot(&prior, &patch, desired, moved).await?
        } else {
            self.persist(&prior, &patch, moved).await?
        };

        info!(
            "Updated appointment {} ({} patient notifications)",
            appointment_id,
            events.len()
        );
        for event in events {
            self.notifier
                .emit_best_effort(updated.patient_id, event.kind(), event.message())
                .await;
        }

        Ok(updated)
    }

    async fn claim_slot(
        &self,
        prior: &Appointment,
        patch: &AppointmentPatch,
        desired: DateTime<Utc>,
        rearm_reminder: bool,
    ) -> Result<Appointment, AppointmentError> {
        if !self.availability.is_available(prior.doctor_id, desired).await? {
            return Err(AppointmentError::SlotUnavailable(
                "Doctor is not available at the requested time".to_string(),
            ));
        }

        let lock = self.locks.acquire(&doctor_lock_key(prior.doctor_id)).await?;
        let result = self.persist_if_free(prior, patch, desired, rearm_reminder).await;
        self.locks.release(lock).await;
        result
    }

    async fn persist_if_free(
        &self,
        prior: &Appointment,
        patch: &AppointmentPatch,
        desired: DateTime<Utc>,
        rearm_reminder: bool,
    ) -> Result<Appointment, AppointmentError> {
        if self.conflicts.has_conflict(prior.doctor_id, desired, Some(prior.id)).await? {
            return Err(AppointmentError::SlotUnavailable(
                "The requested time slot is already booked".to_string(),
            ));
        }
        self.persist(prior, patch, rearm_reminder).await
    }

    async fn persist(
        &self,
        prior: &Appointment,
        patch: &AppointmentPatch,
        rearm_reminder: bool,
    ) -> Result<Appointment, AppointmentError> {
        let mut fields = match encode(patch)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        fields.insert("updated_at".to_string(), encode(&Utc::now())?);
        if rearm_reminder {
            fields.insert("reminder_sent_at".to_string(), Value::Null);
        }

        let id = prior.id.to_string();
        let guard = Query::new().eq("updated_at", prior.updated_at);
        match self
            .store
            .update(Collection::Appointments, &id, Value::Object(fields), &guard)
            .await?
        {
            Some(updated) => Ok(decode(updated)?),
            None if self.store.get(Collection::Appointments, &id).await?.is_some() => {
                warn!("Appointment {} changed while updating", prior.id);
                Err(AppointmentError::Modified)
            }
            None => Err(AppointmentError::NotFound),
        }
    }
}
