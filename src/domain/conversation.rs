//! Lightweight conversation channels.
//!
//! A conversation is the always-available support channel between one user
//! and the admin pool: one per user, created lazily on the first message,
//! never deleted. The record only carries summary fields; the messages
//! themselves live in the append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ConversationId, IdentityId};

/// A persistent conversation summary record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation identifier.
    pub id: ConversationId,
    /// The user this conversation belongs to.
    pub user: IdentityId,
    /// Text of the most recent message (empty until the first append).
    pub last_message: String,
    /// Timestamp of the most recent message.
    pub last_message_time: DateTime<Utc>,
}

impl Conversation {
    /// Creates a fresh conversation for `user`.
    #[must_use]
    pub fn new(user: IdentityId) -> Self {
        Self {
            id: ConversationId::new(),
            user,
            last_message: String::new(),
            last_message_time: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_has_empty_summary() {
        let user = IdentityId::new();
        let convo = Conversation::new(user);
        assert_eq!(convo.user, user);
        assert!(convo.last_message.is_empty());
    }
}
