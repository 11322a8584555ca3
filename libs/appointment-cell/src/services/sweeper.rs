// libs/appointment-cell/src/services/sweeper.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::models::messages;
use notification_cell::{NotificationService, NotificationSink, NotificationType};
use shared_config::AppConfig;
use shared_database::{decode, Collection, DocumentStore, Query, SortDirection};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::consistency::{SchedulingLockService, REMINDER_SWEEP_KEY};

/// Externally triggered scans: upcoming-appointment reminders and the
/// advisory sent when a doctor's schedule changes.
pub struct BatchSweepService {
    store: Arc<dyn DocumentStore>,
    locks: SchedulingLockService,
    notifier: Arc<dyn NotificationSink>,
    reminder_window: Duration,
}

impl BatchSweepService {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            locks: SchedulingLockService::from_config(store.clone(), config),
            notifier: Arc::new(NotificationService::new(store.clone())),
            reminder_window: Duration::hours(config.reminder_window_hours),
            store,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sends at most one reminder per scheduled appointment starting within
    /// the window after `now`. Returns how many reminders went out.
    #[instrument(skip(self))]
    pub async fn sweep_reminders(&self, now: DateTime<Utc>) -> Result<usize, AppointmentError> {
        let lock = self.locks.acquire(REMINDER_SWEEP_KEY).await?;
        let result = self.send_due_reminders(now).await;
        self.locks.release(lock).await;

        let sent = result?;
        info!("Reminder sweep at {} sent {} reminders", now, sent);
        Ok(sent)
    }

    async fn send_due_reminders(&self, now: DateTime<Utc>) -> Result<usize, AppointmentError> {
        let query = Query::new()
            .gte("scheduled_time", now)
            .lte("scheduled_time", now + self.reminder_window)
            .eq("status", AppointmentStatus::Scheduled)
            .is_null("reminder_sent_at")
            .order_by("scheduled_time", SortDirection::Asc);

        let due = self
            .store
            .find(Collection::Appointments, &query)
            .await?
            .into_iter()
            .map(decode::<Appointment>)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("{} appointments due a reminder", due.len());

        let mut sent = 0;
        for appointment in due {
            match self.send_reminder(&appointment).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => warn!("Skipping reminder for appointment {}: {}", appointment.id, e),
            }
        }
        Ok(sent)
    }

    /// Claims the reminder marker before emitting; a failed emission gives
    /// the claim back so a later sweep can retry.
    async fn send_reminder(&self, appointment: &Appointment) -> Result<bool, AppointmentError> {
        let id = appointment.id.to_string();
        let claimed_at = Utc::now();

        let claimed = self
            .store
            .update(
                Collection::Appointments,
                &id,
                json!({ "reminder_sent_at": claimed_at }),
                &Query::new().is_null("reminder_sent_at"),
            )
            .await?;
        if claimed.is_none() {
            debug!("Reminder for appointment {} already claimed", appointment.id);
            return Ok(false);
        }

        match self
            .notifier
            .emit(appointment.patient_id, NotificationType::Appointment, messages::REMINDER)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Reminder for appointment {} not recorded: {}", appointment.id, e);
                let released = self
                    .store
                    .update(
                        Collection::Appointments,
                        &id,
                        json!({ "reminder_sent_at": null }),
                        &Query::new().eq("reminder_sent_at", claimed_at),
                    )
                    .await;
                if let Err(e) = released {
                    warn!("Could not release reminder claim on {}: {}", appointment.id, e);
                }
                Ok(false)
            }
        }
    }

    /// Tells every patient with a live appointment in `[start, end]` that the
    /// doctor's schedule changed. Appointments are left as they are.
    #[instrument(skip(self))]
    pub async fn notify_unavailability(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize, AppointmentError> {
        if start > end {
            return Err(AppointmentError::Validation(
                "startTime must not be after endTime".to_string(),
            ));
        }

        let query = Query::new()
            .eq("doctor_id", doctor_id)
            .gte("scheduled_time", start)
            .lte("scheduled_time", end)
            .neq("status", AppointmentStatus::Cancelled)
            .order_by("scheduled_time", SortDirection::Asc);

        let affected = self
            .store
            .find(Collection::Appointments, &query)
            .await?
            .into_iter()
            .map(decode::<Appointment>)
            .collect::<Result<Vec<_>, _>>()?;

        let mut notified = 0;
        for appointment in &affected {
            if self
                .notifier
                .emit_best_effort(appointment.patient_id, NotificationType::Update, messages::DOCTOR_UNAVAILABLE)
                .await
            {
                notified += 1;
            }
        }

        info!(
            "Doctor {} unavailable {} to {}: notified {} of {} patients",
            doctor_id,
            start,
            end,
            notified,
            affected.len()
        );
        Ok(notified)
    }
}
