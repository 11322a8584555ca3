use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Appointment,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, kind: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            message: message.into(),
            is_read: false,
            timestamp: Utc::now(),
        }
    }
}

/// Patient- and doctor-facing texts emitted by the scheduling engine.
pub mod messages {
    pub const BOOKED_FOR_DOCTOR: &str = "A new appointment has been booked with you.";
    pub const CONFIRMED: &str = "Your appointment has been confirmed.";
    pub const CANCELLED: &str = "Your appointment has been cancelled.";
    pub const NOTES_UPDATED: &str =
        "Notes from your recent appointment have been updated. Please review them.";
    pub const RESCHEDULED: &str = "Your appointment has been rescheduled.";
    pub const COMPLETED: &str = "Your recent appointment has been marked as completed. Thank you!";
    pub const REMINDER: &str = "Reminder: You have an appointment scheduled within the next 24 hours.";
    pub const DOCTOR_UNAVAILABLE: &str = "Your upcoming appointment has been affected due to changes in the doctor's schedule. Please check for rescheduling options.";
    pub const DELETED: &str =
        "Your upcoming appointment has been deleted. If you have questions, please contact us.";
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound => AppError::NotFound("Notification not found".to_string()),
            NotificationError::Store(e) => e.into(),
        }
    }
}
