//! Domain layer: identifiers, persistent records, rooms, and events.
//!
//! This module contains the server-side domain model: typed identifiers,
//! the chat/conversation/message/notification records, the canonical room
//! key scheme, and the dispatch events emitted after every mutation.

pub mod chat;
pub mod conversation;
pub mod event;
pub mod id;
pub mod message;
pub mod notification;
pub mod room;

pub use chat::{Chat, ChatStatus};
pub use conversation::Conversation;
pub use event::DispatchEvent;
pub use id::{ChatId, ConnectionId, ConversationId, IdentityId, MessageId, NotificationId, Role};
pub use message::Message;
pub use notification::Notification;
pub use room::{ChannelId, RoomId};
