//! WebSocket wire protocol: inbound client events and outbound server
//! events.
//!
//! Both directions use internally tagged JSON (`{"event": "...", ...}`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, ChatId, ConversationId, IdentityId, Message, NotificationId};

/// Client-to-server socket events.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Subscribe to a conversation room.
    JoinConversation {
        /// Target conversation.
        conversation_id: ConversationId,
    },
    /// Unsubscribe from a conversation room.
    LeaveConversation {
        /// Target conversation.
        conversation_id: ConversationId,
    },
    /// Subscribe to a chat room. An admin joining also claims the chat.
    JoinChat {
        /// Target chat.
        chat_id: ChatId,
    },
    /// Unsubscribe from a chat room.
    LeaveChat {
        /// Target chat.
        chat_id: ChatId,
    },
    /// Send a message into a chat session.
    SendMessage {
        /// Target chat.
        chat_id: ChatId,
        /// Message body.
        content: String,
    },
    /// Admin typing indicator.
    AdminTyping {
        /// Target chat.
        chat_id: ChatId,
    },
    /// User typing indicator.
    UserTyping {
        /// Target chat.
        chat_id: ChatId,
    },
}

/// Server-to-client socket events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A new chat was opened (admin room only).
    NewChat {
        /// The new chat.
        chat_id: ChatId,
        /// The user who opened it.
        user_id: IdentityId,
        /// The chat's category.
        category: String,
    },
    /// A user sent a message (all admin connections).
    NewMessage {
        /// The persisted message.
        message: Message,
    },
    /// An admin replied (channel room).
    AdminResponse {
        /// The persisted message.
        message: Message,
    },
    /// A channel's summary changed (global broadcast for dashboards).
    ConversationUpdate {
        /// The channel whose summary changed.
        channel: ChannelId,
        /// Text of the latest message.
        last_message: String,
        /// Timestamp of the latest message.
        last_message_time: DateTime<Utc>,
    },
    /// A chat was resolved (chat room).
    ChatResolved {
        /// The resolved chat.
        chat_id: ChatId,
        /// The resolving admin.
        admin_id: IdentityId,
    },
    /// An admin claimed a chat (chat room).
    AdminJoined {
        /// The claimed chat.
        chat_id: ChatId,
        /// The claiming admin.
        admin_id: IdentityId,
    },
    /// Admin typing indicator (chat room minus the sender).
    AdminTyping {
        /// The chat being typed into.
        chat_id: ChatId,
        /// The typing admin.
        admin_id: IdentityId,
    },
    /// User typing indicator (chat room minus the sender).
    UserTyping {
        /// The chat being typed into.
        chat_id: ChatId,
        /// The typing user.
        user_id: IdentityId,
    },
    /// An admin-created notification (targeted or broadcast).
    Notification {
        /// Notification identifier.
        id: NotificationId,
        /// Short title.
        title: String,
        /// Longer description body.
        description: String,
    },
    /// An operation on this connection failed.
    Error {
        /// Numeric error code (same codes as the REST surface).
        code: u32,
        /// Human-readable message.
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn client_events_parse_by_tag() {
        let chat_id = ChatId::new();
        let json = format!(r#"{{"event":"send_message","chat_id":"{chat_id}","content":"hi"}}"#);
        let parsed: Result<ClientEvent, _> = serde_json::from_str(&json);
        let Ok(ClientEvent::SendMessage { chat_id: id, content }) = parsed else {
            panic!("expected send_message event");
        };
        assert_eq!(id, chat_id);
        assert_eq!(content, "hi");
    }

    #[test]
    fn unknown_event_is_rejected() {
        let parsed: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"drop_tables","chat_id":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn server_events_serialize_with_snake_case_tag() {
        let event = ServerEvent::ChatResolved {
            chat_id: ChatId::new(),
            admin_id: IdentityId::new(),
        };
        let json = serde_json::to_value(&event).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(
            json.get("event").and_then(|v| v.as_str()),
            Some("chat_resolved")
        );
    }
}
