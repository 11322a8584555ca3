use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::ConflictPolicy;
use shared_database::{decode, Collection, DocumentStore, Query};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Exclusive bounds an existing appointment's start must fall between to
/// clash with a booking at `desired`.
pub fn conflict_window(
    desired: DateTime<Utc>,
    duration: Duration,
    policy: ConflictPolicy,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match policy {
        ConflictPolicy::Overlap => (desired - duration, desired + duration),
        ConflictPolicy::Legacy => (desired, desired + duration),
    }
}

pub struct ConflictDetectionService {
    store: Arc<dyn DocumentStore>,
    policy: ConflictPolicy,
    duration: Duration,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: ConflictPolicy, duration: Duration) -> Self {
        Self {
            store,
            policy,
            duration,
        }
    }

    /// Whether another appointment of the doctor already occupies `desired`.
    /// `exclude` skips the appointment being rescheduled.
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        desired: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        let (after, before) = conflict_window(desired, self.duration, self.policy);

        let mut query = Query::new()
            .eq("doctor_id", doctor_id)
            .gt("scheduled_time", after)
            .lt("scheduled_time", before);
        if self.policy == ConflictPolicy::Overlap {
            query = query.neq("status", AppointmentStatus::Cancelled);
        }
        if let Some(id) = exclude {
            query = query.neq("id", id);
        }

        let clashing = self
            .store
            .find(Collection::Appointments, &query)
            .await?
            .into_iter()
            .map(decode::<Appointment>)
            .collect::<Result<Vec<_>, _>>()?;

        if clashing.is_empty() {
            debug!("No conflict for doctor {} at {}", doctor_id, desired);
            return Ok(false);
        }

        warn!(
            "Conflict detected for doctor {} at {} - {} overlapping appointments",
            doctor_id,
            desired,
            clashing.len()
        );
        Ok(true)
    }
}
