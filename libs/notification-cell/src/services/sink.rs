use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use security_cell::{clinic_capabilities, Action, ResourceOwners, ResourceType};
use shared_database::{decode, encode, Collection, DocumentStore, Query, SortDirection};
use shared_models::auth::Credentials;

use crate::models::{Notification, NotificationError, NotificationType};

/// Append-only destination for notification records.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn emit(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        message: &str,
    ) -> Result<Notification, NotificationError>;

    /// Emits and logs a failure instead of returning it. Returns whether the
    /// notification was recorded.
    async fn emit_best_effort(&self, user_id: Uuid, kind: NotificationType, message: &str) -> bool {
        match self.emit(user_id, kind, message).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to notify {}: {}", user_id, e);
                false
            }
        }
    }
}

pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The caller's notifications, unread first, newest first within each group.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, NotificationError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_by("is_read", SortDirection::Asc)
            .order_by("timestamp", SortDirection::Desc);

        let rows = self.store.find(Collection::Notifications, &query).await?;
        let notifications = rows
            .into_iter()
            .map(decode::<Notification>)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Found {} notifications for {}", notifications.len(), user_id);
        Ok(notifications)
    }

    pub async fn mark_read(
        &self,
        requester: &Credentials,
        notification_id: Uuid,
    ) -> Result<Notification, NotificationError> {
        self.load_owned(requester, notification_id, Action::Update).await?;

        let updated = self
            .store
            .update(
                Collection::Notifications,
                &notification_id.to_string(),
                json!({ "is_read": true }),
                &Query::new(),
            )
            .await?
            .ok_or(NotificationError::NotFound)?;

        Ok(decode(updated)?)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<usize, NotificationError> {
        let unread = Query::new().eq("user_id", user_id).eq("is_read", false);
        let rows = self.store.find(Collection::Notifications, &unread).await?;

        let mut marked = 0;
        for row in rows {
            let notification: Notification = decode(row)?;
            let applied = self
                .store
                .update(
                    Collection::Notifications,
                    &notification.id.to_string(),
                    json!({ "is_read": true }),
                    &Query::new().eq("user_id", user_id),
                )
                .await?;
            if applied.is_some() {
                marked += 1;
            }
        }

        info!("Marked {} notifications read for {}", marked, user_id);
        Ok(marked)
    }

    pub async fn delete(&self, requester: &Credentials, notification_id: Uuid) -> Result<(), NotificationError> {
        self.load_owned(requester, notification_id, Action::Delete).await?;

        let deleted = self
            .store
            .delete(Collection::Notifications, &notification_id.to_string(), &Query::new())
            .await?;
        if !deleted {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    /// Someone else's notification is reported as missing.
    async fn load_owned(
        &self,
        requester: &Credentials,
        notification_id: Uuid,
        action: Action,
    ) -> Result<Notification, NotificationError> {
        let row = self
            .store
            .get(Collection::Notifications, &notification_id.to_string())
            .await?
            .ok_or(NotificationError::NotFound)?;
        let notification: Notification = decode(row)?;

        let owners = ResourceOwners::user(notification.user_id);
        if !clinic_capabilities().is_permitted(requester, ResourceType::Notification, action, &owners) {
            debug!("{} asked for notification {} it does not own", requester.user_id, notification_id);
            return Err(NotificationError::NotFound);
        }
        Ok(notification)
    }
}

#[async_trait]
impl NotificationSink for NotificationService {
    async fn emit(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        message: &str,
    ) -> Result<Notification, NotificationError> {
        let notification = Notification::new(user_id, kind, message);
        self.store
            .insert(Collection::Notifications, encode(&notification)?)
            .await?;
        debug!("Notification {} recorded for {}", notification.id, user_id);
        Ok(notification)
    }
}
