// libs/appointment-cell/src/services/consistency.rs
//
// SCHEDULING LOCKS
// Serializes booking and rescheduling per doctor so that the conflict check
// and the write it guards cannot interleave with another request.
//

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{decode, encode, Collection, DocumentStore, Query, StoreError};

use crate::models::AppointmentError;

pub const REMINDER_SWEEP_KEY: &str = "reminder-sweep";

pub fn doctor_lock_key(doctor_id: Uuid) -> String {
    format!("doctor:{}", doctor_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockRecord {
    id: String,
    holder: Uuid,
    acquired_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Proof of a held lock; hand it back to `release`.
#[derive(Debug)]
pub struct SchedulingLock {
    key: String,
    holder: Uuid,
}

impl SchedulingLock {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Locks are rows keyed by name in `scheduling_locks`; the store's unique id
/// constraint makes the insert the acquisition. A lock past its expiry may
/// be taken over.
pub struct SchedulingLockService {
    store: Arc<dyn DocumentStore>,
    ttl: Duration,
    max_attempts: u32,
}

impl SchedulingLockService {
    pub fn new(store: Arc<dyn DocumentStore>, ttl: Duration, max_attempts: u32) -> Self {
        Self {
            store,
            ttl,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self::new(
            store,
            Duration::seconds(config.scheduling_lock_ttl_seconds),
            config.scheduling_lock_max_attempts,
        )
    }

    /// Retries with linear backoff; `SchedulingBusy` once attempts run out.
    #[instrument(skip(self))]
    pub async fn acquire(&self, key: &str) -> Result<SchedulingLock, AppointmentError> {
        for attempt in 1..=self.max_attempts {
            if let Some(lock) = self.try_acquire(key).await? {
                debug!("Acquired scheduling lock {} on attempt {}", key, attempt);
                return Ok(lock);
            }
            if attempt < self.max_attempts {
                debug!("Scheduling lock {} is held, retrying {}/{}", key, attempt, self.max_attempts);
                tokio::time::sleep(std::time::Duration::from_millis(100 * attempt as u64)).await;
            }
        }

        warn!("Gave up on scheduling lock {} after {} attempts", key, self.max_attempts);
        Err(AppointmentError::SchedulingBusy)
    }

    /// Failures are logged only; an unreleased lock expires on its own.
    pub async fn release(&self, lock: SchedulingLock) {
        let guard = Query::new().eq("holder", lock.holder);
        match self.store.delete(Collection::SchedulingLocks, &lock.key, &guard).await {
            Ok(true) => debug!("Released scheduling lock {}", lock.key),
            Ok(false) => warn!("Scheduling lock {} was no longer ours to release", lock.key),
            Err(e) => warn!("Failed to release scheduling lock {}: {}", lock.key, e),
        }
    }

    async fn try_acquire(&self, key: &str) -> Result<Option<SchedulingLock>, AppointmentError> {
        if let Some(lock) = self.insert_lock(key).await? {
            return Ok(Some(lock));
        }
        if self.evict_if_stale(key).await? {
            return self.insert_lock(key).await;
        }
        Ok(None)
    }

    async fn insert_lock(&self, key: &str) -> Result<Option<SchedulingLock>, AppointmentError> {
        let now = Utc::now();
        let record = LockRecord {
            id: key.to_string(),
            holder: Uuid::new_v4(),
            acquired_at: now,
            expires_at: now + self.ttl,
        };

        match self.store.insert(Collection::SchedulingLocks, encode(&record)?).await {
            Ok(_) => Ok(Some(SchedulingLock {
                key: record.id,
                holder: record.holder,
            })),
            Err(StoreError::Duplicate(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the lock only if it is expired and still held by the same holder.
    async fn evict_if_stale(&self, key: &str) -> Result<bool, AppointmentError> {
        let Some(row) = self.store.get(Collection::SchedulingLocks, key).await? else {
            return Ok(false);
        };
        let current: LockRecord = decode(row)?;
        if current.expires_at > Utc::now() {
            return Ok(false);
        }

        let guard = Query::new().eq("holder", current.holder);
        let evicted = self.store.delete(Collection::SchedulingLocks, key, &guard).await?;
        if evicted {
            info!("Took over stale scheduling lock {} from {}", key, current.holder);
        }
        Ok(evicted)
    }
}
