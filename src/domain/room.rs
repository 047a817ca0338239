//! Canonical room and channel keys.
//!
//! The two legacy socket services disagreed on room naming (`<id>` vs
//! `conversation:<id>`); this module is the single reconciled scheme.
//! [`ChannelId`] identifies a persisted message stream (chat or
//! conversation); [`RoomId`] extends it with the implicit admin broadcast
//! room that every admin connection joins on registration.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{ChatId, ConversationId};

/// Persistence-side identifier of a message stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ChannelId {
    /// A support chat session.
    Chat(ChatId),
    /// A lightweight conversation.
    Conversation(ConversationId),
}

impl ChannelId {
    /// Returns the broadcast room backing this channel.
    #[must_use]
    pub const fn room(self) -> RoomId {
        match self {
            Self::Chat(id) => RoomId::Chat(id),
            Self::Conversation(id) => RoomId::Conversation(id),
        }
    }

    /// Returns the inner [`uuid::Uuid`] regardless of variant.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        match self {
            Self::Chat(id) => id.as_uuid(),
            Self::Conversation(id) => id.as_uuid(),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat(id) => write!(f, "chat:{id}"),
            Self::Conversation(id) => write!(f, "conversation:{id}"),
        }
    }
}

/// A named broadcast group of live connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// Room of a support chat session.
    Chat(ChatId),
    /// Room of a lightweight conversation.
    Conversation(ConversationId),
    /// Implicit room containing every connected admin.
    Admins,
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat(id) => write!(f, "chat:{id}"),
            Self::Conversation(id) => write!(f, "conversation:{id}"),
            Self::Admins => write!(f, "admins"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn channel_room_round_trip() {
        let chat = ChatId::new();
        assert_eq!(ChannelId::Chat(chat).room(), RoomId::Chat(chat));

        let convo = ConversationId::new();
        assert_eq!(
            ChannelId::Conversation(convo).room(),
            RoomId::Conversation(convo)
        );
    }

    #[test]
    fn room_keys_are_canonical() {
        let chat = ChatId::new();
        assert_eq!(format!("{}", RoomId::Chat(chat)), format!("chat:{chat}"));

        let convo = ConversationId::new();
        assert_eq!(
            format!("{}", RoomId::Conversation(convo)),
            format!("conversation:{convo}")
        );
        assert_eq!(format!("{}", RoomId::Admins), "admins");
    }

    #[test]
    fn channel_serde_is_tagged() {
        let chat = ChatId::new();
        let json = serde_json::to_value(ChannelId::Chat(chat)).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json.get("kind").and_then(|v| v.as_str()), Some("chat"));
        assert_eq!(
            json.get("id").and_then(|v| v.as_str()),
            Some(chat.to_string().as_str())
        );
    }
}
