//! Notification service.
//!
//! Admin-created notifications are persisted and, when the target is
//! connected, delivered live over the socket. Broadcasts (no target) fan
//! out to every connected user.

use std::sync::Arc;

use crate::domain::{DispatchEvent, IdentityId, Notification, NotificationId};
use crate::error::GatewayError;
use crate::realtime::Dispatcher;
use crate::store::Store;

/// Orchestrates persistent notifications.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
    dispatcher: Arc<Dispatcher>,
}

impl NotificationService {
    /// Creates a notification service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Creates a broadcast notification addressed to every user.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for a missing title or description.
    pub async fn broadcast(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Notification, GatewayError> {
        let notification =
            Notification::broadcast(required(title, "title")?, required(description, "description")?);
        self.persist_and_dispatch(notification).await
    }

    /// Creates a notification addressed to a single user.
    ///
    /// The target account itself lives with the external account system;
    /// only the identity reference is recorded here.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for a missing title or description.
    pub async fn send_to_user(
        &self,
        target: IdentityId,
        title: &str,
        description: &str,
    ) -> Result<Notification, GatewayError> {
        let notification = Notification::targeted(
            target,
            required(title, "title")?,
            required(description, "description")?,
        );
        self.persist_and_dispatch(notification).await
    }

    async fn persist_and_dispatch(
        &self,
        notification: Notification,
    ) -> Result<Notification, GatewayError> {
        self.store.insert_notification(&notification).await?;
        tracing::info!(
            notification_id = %notification.id,
            broadcast = notification.target.is_none(),
            "notification created"
        );
        self.dispatcher
            .dispatch(DispatchEvent::Notification {
                notification: notification.clone(),
            })
            .await;
        Ok(notification)
    }

    /// Returns every notification, newest first (admin view).
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    pub async fn all(&self) -> Result<Vec<Notification>, GatewayError> {
        self.store.notifications().await
    }

    /// Returns notifications visible to `user` (targeted + broadcast).
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    pub async fn for_user(&self, user: IdentityId) -> Result<Vec<Notification>, GatewayError> {
        self.store.notifications_for(user).await
    }

    /// Flips the read flag of a notification.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] for an unknown notification.
    pub async fn toggle_read(&self, id: NotificationId) -> Result<Notification, GatewayError> {
        let mut notification = self
            .store
            .notification(id)
            .await?
            .ok_or_else(|| GatewayError::NotFound("notification", id.to_string()))?;
        notification.read = !notification.read;
        self.store.save_notification(&notification).await?;
        Ok(notification)
    }

    /// Deletes a notification.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] for an unknown notification.
    pub async fn delete(&self, id: NotificationId) -> Result<(), GatewayError> {
        self.store.delete_notification(id).await
    }
}

fn required(value: &str, field: &str) -> Result<String, GatewayError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GatewayError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}
