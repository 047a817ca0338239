//! Persisted messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{IdentityId, MessageId, Role};
use super::room::ChannelId;

/// A persisted message, immutable once created.
///
/// Messages reference their owning channel (chat or conversation) by id;
/// they are stored independently and queried by channel, never embedded in
/// the channel record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// The identity that sent the message.
    pub sender: IdentityId,
    /// Role of the sender at send time.
    pub sender_role: Role,
    /// Message body.
    pub content: String,
    /// The channel this message belongs to.
    pub channel: ChannelId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new message for `channel`.
    #[must_use]
    pub fn new(channel: ChannelId, sender: IdentityId, sender_role: Role, content: String) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            sender_role,
            content,
            channel,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::id::ChatId;

    #[test]
    fn message_captures_sender_and_channel() {
        let channel = ChannelId::Chat(ChatId::new());
        let sender = IdentityId::new();
        let msg = Message::new(channel, sender, Role::User, "hello".to_string());

        assert_eq!(msg.channel, channel);
        assert_eq!(msg.sender, sender);
        assert_eq!(msg.sender_role, Role::User);
        assert_eq!(msg.content, "hello");
    }
}
