#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use appointment_cell::{Appointment, AppointmentStatus};
use doctor_cell::{DayAvailability, DayOfWeek, Doctor, TimeSlot};
use notification_cell::{Notification, NotificationError, NotificationSink, NotificationType};
use shared_config::AppConfig;
use shared_database::{decode, encode, Collection, DocumentStore, InMemoryStore, Query, StoreError};
use shared_utils::test_utils::TestConfig;

pub fn config() -> AppConfig {
    TestConfig::default().to_app_config()
}

/// 2025-03-05 is a Wednesday; Johannesburg is UTC+2.
pub fn wednesday_utc(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 5, hour, minute, 0).unwrap()
}

/// Doctor seeing patients Wednesdays 08:00-17:00 clinic time.
pub async fn seed_doctor(store: &InMemoryStore) -> Uuid {
    let now = Utc::now();
    let doctor = Doctor {
        id: Uuid::new_v4(),
        full_name: Some("Dr. Naledi Dube".to_string()),
        specialty: "General Practice".to_string(),
        availability: vec![DayAvailability {
            day: DayOfWeek::Wednesday,
            time_slots: vec![TimeSlot::new("08:00", "17:00")],
        }],
        appointments: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    store
        .insert(Collection::Doctors, encode(&doctor).unwrap())
        .await
        .unwrap();
    doctor.id
}

pub async fn seed_account(store: &InMemoryStore, collection: Collection) -> Uuid {
    let id = Uuid::new_v4();
    store
        .insert(
            collection,
            json!({ "id": id, "appointments": [], "created_at": Utc::now(), "updated_at": Utc::now() }),
        )
        .await
        .unwrap();
    id
}

pub async fn seed_appointment(
    store: &InMemoryStore,
    doctor_id: Uuid,
    patient_id: Uuid,
    scheduled_time: DateTime<Utc>,
    status: AppointmentStatus,
) -> Uuid {
    let now = Utc::now();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        doctor_id,
        patient_id,
        admin_id: None,
        scheduled_time,
        status,
        notes: "Follow-up".to_string(),
        reminder_sent_at: None,
        created_at: now,
        updated_at: now,
    };
    store
        .insert(Collection::Appointments, encode(&appointment).unwrap())
        .await
        .unwrap();
    appointment.id
}

pub async fn references(store: &InMemoryStore, collection: Collection, id: Uuid) -> Vec<Value> {
    let row = store.get(collection, &id.to_string()).await.unwrap().unwrap();
    row["appointments"].as_array().cloned().unwrap_or_default()
}

pub async fn notifications_for(store: &InMemoryStore, user_id: Uuid) -> Vec<Notification> {
    store
        .find(Collection::Notifications, &Query::new().eq("user_id", user_id))
        .await
        .unwrap()
        .into_iter()
        .map(|row| decode::<Notification>(row).unwrap())
        .collect()
}

/// Sink whose every emission fails.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn emit(&self, _: Uuid, _: NotificationType, _: &str) -> Result<Notification, NotificationError> {
        Err(NotificationError::Store(StoreError::Unavailable("sink offline".to_string())))
    }
}

/// Store that refuses to index appointments on admin accounts.
pub struct AdminIndexFailure {
    pub inner: Arc<InMemoryStore>,
}

#[async_trait]
impl DocumentStore for AdminIndexFailure {
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        self.inner.insert(collection, document).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.inner.find(collection, query).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        guard: &Query,
    ) -> Result<Option<Value>, StoreError> {
        self.inner.update(collection, id, patch, guard).await
    }

    async fn delete(&self, collection: Collection, id: &str, guard: &Query) -> Result<bool, StoreError> {
        self.inner.delete(collection, id, guard).await
    }

    async fn push_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        if collection == Collection::Admins {
            return Err(StoreError::Backend("admins table unavailable".to_string()));
        }
        self.inner.push_reference(collection, id, field, value).await
    }

    async fn pull_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.inner.pull_reference(collection, id, field, value).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

pub enum Interference {
    /// Every update of the target fails.
    FailUpdates,
    /// Another writer edits the target just before the first update lands.
    EditFirst,
}

/// Store that interferes with updates of a single appointment.
pub struct InterferingStore {
    pub inner: Arc<InMemoryStore>,
    pub target: Uuid,
    pub interference: Interference,
    pub fired: AtomicBool,
}

impl InterferingStore {
    pub fn new(inner: Arc<InMemoryStore>, target: Uuid, interference: Interference) -> Self {
        Self {
            inner,
            target,
            interference,
            fired: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DocumentStore for InterferingStore {
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        self.inner.insert(collection, document).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.inner.find(collection, query).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        guard: &Query,
    ) -> Result<Option<Value>, StoreError> {
        if collection == Collection::Appointments && id == self.target.to_string() {
            match self.interference {
                Interference::FailUpdates => {
                    return Err(StoreError::Unavailable("appointments shard offline".to_string()));
                }
                Interference::EditFirst => {
                    if !self.fired.swap(true, Ordering::SeqCst) {
                        let edit = json!({
                            "notes": "Edited at the front desk",
                            "updated_at": Utc::now() + chrono::Duration::seconds(1),
                        });
                        self.inner.update(collection, id, edit, &Query::new()).await?;
                    }
                }
            }
        }
        self.inner.update(collection, id, patch, guard).await
    }

    async fn delete(&self, collection: Collection, id: &str, guard: &Query) -> Result<bool, StoreError> {
        self.inner.delete(collection, id, guard).await
    }

    async fn push_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.inner.push_reference(collection, id, field, value).await
    }

    async fn pull_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.inner.pull_reference(collection, id, field, value).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}
