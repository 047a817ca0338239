//! Notification endpoint DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Notification;

/// Request body for creating a notification.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateNotificationRequest {
    /// Short title.
    pub title: String,
    /// Longer description body.
    pub description: String,
}

/// A notification as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationDto {
    /// Notification identifier.
    pub id: Uuid,
    /// Target user; `null` for a broadcast.
    pub target_id: Option<Uuid>,
    /// Short title.
    pub title: String,
    /// Longer description body.
    pub description: String,
    /// Whether the notification has been read.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationDto {
    fn from(notification: &Notification) -> Self {
        Self {
            id: *notification.id.as_uuid(),
            target_id: notification.target.map(|t| *t.as_uuid()),
            title: notification.title.clone(),
            description: notification.description.clone(),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
