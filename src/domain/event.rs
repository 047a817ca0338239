//! Dispatch events emitted after state mutations.
//!
//! Every mutation that interested clients must hear about produces a
//! [`DispatchEvent`]; the dispatcher owns the routing rules that decide
//! which live connections receive the resulting wire frames. Typing events
//! carry the sender's connection so it can be excluded from the fan-out.

use super::chat::Chat;
use super::id::{ChatId, ConnectionId, IdentityId, Role};
use super::message::Message;
use super::notification::Notification;

/// An event to be fanned out to live connections.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A user opened a new chat session. Routed to the admin room only.
    NewChat {
        /// The freshly created chat.
        chat: Chat,
    },

    /// A user sent a message. Routed to all admin connections, plus a
    /// derived `conversation_update` broadcast.
    NewMessage {
        /// The persisted message.
        message: Message,
    },

    /// An admin replied. Routed to the channel's room plus a global
    /// `conversation_update` broadcast.
    AdminResponse {
        /// The persisted message.
        message: Message,
    },

    /// An admin claimed a chat. Routed to the chat's room.
    AdminJoined {
        /// The claimed chat.
        chat_id: ChatId,
        /// The claiming admin.
        admin: IdentityId,
    },

    /// An admin resolved a chat. Routed to the chat's room.
    ChatResolved {
        /// The resolved chat.
        chat_id: ChatId,
        /// The resolving admin.
        admin: IdentityId,
    },

    /// Someone is typing in a chat. Routed to the chat's room minus the
    /// sender; never persisted.
    Typing {
        /// The chat being typed into.
        chat_id: ChatId,
        /// Connection to exclude from the fan-out.
        sender_connection: ConnectionId,
        /// The typing identity.
        sender: IdentityId,
        /// Role of the typist (selects the outbound event name).
        role: Role,
    },

    /// An admin-created notification. Routed to the target user's live
    /// connection, or to every connected user for a broadcast.
    Notification {
        /// The persisted notification.
        notification: Notification,
    },
}
