//! Persistent notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{IdentityId, NotificationId};

/// An admin-created notification.
///
/// `target == None` means broadcast-to-all; otherwise the notification is
/// addressed to a single user. Mutated only by the read-toggle, deleted
/// explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Target user; `None` for a broadcast.
    pub target: Option<IdentityId>,
    /// Short title.
    pub title: String,
    /// Longer description body.
    pub description: String,
    /// Whether the notification has been read.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a broadcast notification addressed to every user.
    #[must_use]
    pub fn broadcast(title: String, description: String) -> Self {
        Self {
            id: NotificationId::new(),
            target: None,
            title,
            description,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// Creates a notification addressed to a single user.
    #[must_use]
    pub fn targeted(target: IdentityId, title: String, description: String) -> Self {
        Self {
            target: Some(target),
            ..Self::broadcast(title, description)
        }
    }

    /// Returns `true` if `user` should see this notification.
    #[must_use]
    pub fn visible_to(&self, user: IdentityId) -> bool {
        match self.target {
            None => true,
            Some(target) => target == user,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_is_visible_to_everyone() {
        let n = Notification::broadcast("title".to_string(), "body".to_string());
        assert!(n.target.is_none());
        assert!(n.visible_to(IdentityId::new()));
        assert!(!n.read);
    }

    #[test]
    fn targeted_is_visible_to_target_only() {
        let user = IdentityId::new();
        let n = Notification::targeted(user, "title".to_string(), "body".to_string());
        assert!(n.visible_to(user));
        assert!(!n.visible_to(IdentityId::new()));
    }
}
