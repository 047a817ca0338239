//! Support chat sessions and their lifecycle.
//!
//! A [`Chat`] moves through `pending → active → resolved`; `resolved` is
//! terminal. The transition guards live here so the state machine can be
//! tested without a store or dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ChatId, IdentityId, Role};
use crate::error::GatewayError;

/// Lifecycle state of a support chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    /// Created by a user, waiting for an admin to claim it.
    Pending,
    /// An admin has joined; the session is live.
    Active,
    /// Closed by an admin. Terminal: no further messages are accepted.
    Resolved,
}

impl ChatStatus {
    /// Returns `true` while the session still accepts messages.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    /// Canonical string form, matching the wire and store encoding.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }
}

/// A persistent support chat session.
///
/// Messages are not embedded: they live in the append-only message log
/// keyed by `ChannelId::Chat(id)`, and `last_message` is a cached
/// projection bumped by the persistence gateway on every append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Chat identifier.
    pub id: ChatId,
    /// The user who opened the session.
    pub user: IdentityId,
    /// The admin who claimed the session; `None` while pending.
    pub admin: Option<IdentityId>,
    /// Current lifecycle state.
    pub status: ChatStatus,
    /// Free-form category supplied on creation (e.g. `"billing"`).
    pub category: String,
    /// Timestamp of the most recent message (creation time until then).
    pub last_message: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Creates a new pending chat for `user`.
    #[must_use]
    pub fn new(user: IdentityId, category: String) -> Self {
        let now = Utc::now();
        Self {
            id: ChatId::new(),
            user,
            admin: None,
            status: ChatStatus::Pending,
            category,
            last_message: now,
            created_at: now,
        }
    }

    /// Claims the chat for `admin` (`pending → active`).
    ///
    /// Returns `true` if the chat changed, `false` for the idempotent
    /// re-claim by the already-assigned admin.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if a different admin already holds the
    /// session, [`GatewayError::ChatClosed`] if it is resolved.
    pub fn claim(&mut self, admin: IdentityId) -> Result<bool, GatewayError> {
        match self.status {
            ChatStatus::Pending => {
                self.admin = Some(admin);
                self.status = ChatStatus::Active;
                Ok(true)
            }
            ChatStatus::Active if self.admin == Some(admin) => Ok(false),
            ChatStatus::Active => Err(GatewayError::Conflict(format!(
                "chat {} is already claimed by another admin",
                self.id
            ))),
            ChatStatus::Resolved => Err(GatewayError::ChatClosed(*self.id.as_uuid())),
        }
    }

    /// Resolves the chat (`pending|active → resolved`).
    ///
    /// # Errors
    ///
    /// [`GatewayError::ChatClosed`] if the chat is already resolved.
    pub fn resolve(&mut self) -> Result<(), GatewayError> {
        if self.status == ChatStatus::Resolved {
            return Err(GatewayError::ChatClosed(*self.id.as_uuid()));
        }
        self.status = ChatStatus::Resolved;
        Ok(())
    }

    /// Access rule: the chat's own user, or any admin.
    #[must_use]
    pub fn accessible_by(&self, identity: IdentityId, role: Role) -> bool {
        role.is_admin() || self.user == identity
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn pending_chat() -> Chat {
        Chat::new(IdentityId::new(), "billing".to_string())
    }

    #[test]
    fn new_chat_is_pending_and_unassigned() {
        let chat = pending_chat();
        assert_eq!(chat.status, ChatStatus::Pending);
        assert!(chat.admin.is_none());
        assert!(chat.status.is_open());
    }

    #[test]
    fn claim_assigns_admin_and_activates() {
        let mut chat = pending_chat();
        let admin = IdentityId::new();

        let changed = chat.claim(admin);
        assert_eq!(changed.ok(), Some(true));
        assert_eq!(chat.status, ChatStatus::Active);
        assert_eq!(chat.admin, Some(admin));
    }

    #[test]
    fn reclaim_by_same_admin_is_noop() {
        let mut chat = pending_chat();
        let admin = IdentityId::new();
        let _ = chat.claim(admin);

        let changed = chat.claim(admin);
        assert_eq!(changed.ok(), Some(false));
        assert_eq!(chat.admin, Some(admin));
    }

    #[test]
    fn claim_by_other_admin_conflicts() {
        let mut chat = pending_chat();
        let _ = chat.claim(IdentityId::new());

        let result = chat.claim(IdentityId::new());
        assert!(matches!(result, Err(GatewayError::Conflict(_))));
    }

    #[test]
    fn resolve_is_terminal() {
        let mut chat = pending_chat();
        assert!(chat.resolve().is_ok());
        assert_eq!(chat.status, ChatStatus::Resolved);
        assert!(!chat.status.is_open());

        assert!(matches!(chat.resolve(), Err(GatewayError::ChatClosed(_))));
        assert!(matches!(
            chat.claim(IdentityId::new()),
            Err(GatewayError::ChatClosed(_))
        ));
    }

    #[test]
    fn pending_chat_can_be_resolved_directly() {
        let mut chat = pending_chat();
        assert!(chat.resolve().is_ok());
        assert_eq!(chat.status, ChatStatus::Resolved);
    }

    #[test]
    fn access_is_owner_or_any_admin() {
        let chat = pending_chat();
        assert!(chat.accessible_by(chat.user, Role::User));
        assert!(chat.accessible_by(IdentityId::new(), Role::Admin));
        assert!(!chat.accessible_by(IdentityId::new(), Role::User));
    }
}
