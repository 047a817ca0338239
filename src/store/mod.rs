//! Persistence layer: the document-store seam and its implementations.
//!
//! The gateway treats storage as an external document store with
//! find/save/delete semantics. [`Store`] is that seam; [`MemoryStore`]
//! backs tests and local development, [`PostgresStore`] backs production.
//! The [`gateway::MessageGateway`] sits on top and owns the append+summary
//! write discipline.

pub mod gateway;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{
    ChannelId, Chat, ChatId, Conversation, ConversationId, IdentityId, Message, Notification,
    NotificationId,
};
use crate::error::GatewayError;

pub use gateway::MessageGateway;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Document-store seam.
///
/// Implementations must provide the single atomic guarantee the chat
/// state machine relies on: [`Store::insert_chat`] fails with a conflict
/// when the user already has an open chat, even under concurrent calls.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Inserts a new chat, enforcing the single-open-chat-per-user
    /// invariant atomically.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if the user already has a chat in
    /// pending or active state; [`GatewayError::Persistence`] on store
    /// failure.
    async fn insert_chat(&self, chat: Chat) -> Result<Chat, GatewayError>;

    /// Finds a chat by id.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn chat(&self, id: ChatId) -> Result<Option<Chat>, GatewayError>;

    /// Saves the full state of an existing chat.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] if the chat does not exist,
    /// [`GatewayError::Persistence`] on store failure.
    async fn save_chat(&self, chat: &Chat) -> Result<(), GatewayError>;

    /// Returns all chats where `identity` is the user or the assigned
    /// admin, sorted by most recent activity descending.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn chats_for(&self, identity: IdentityId) -> Result<Vec<Chat>, GatewayError>;

    /// Finds a conversation by id.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, GatewayError>;

    /// Finds the conversation belonging to `user`, if one exists.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn conversation_for_user(
        &self,
        user: IdentityId,
    ) -> Result<Option<Conversation>, GatewayError>;

    /// Inserts or updates a conversation record.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), GatewayError>;

    /// Returns all conversations sorted by last message time descending.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn conversations(&self) -> Result<Vec<Conversation>, GatewayError>;

    /// Appends a message to the log. Messages are immutable once written.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn append_message(&self, message: &Message) -> Result<(), GatewayError>;

    /// Returns all messages of a channel ordered by creation time
    /// ascending.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn messages_of(&self, channel: ChannelId) -> Result<Vec<Message>, GatewayError>;

    /// Inserts a notification record.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn insert_notification(&self, notification: &Notification) -> Result<(), GatewayError>;

    /// Finds a notification by id.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, GatewayError>;

    /// Returns all notifications, newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn notifications(&self) -> Result<Vec<Notification>, GatewayError>;

    /// Returns notifications visible to `user` (targeted + broadcast),
    /// newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    async fn notifications_for(
        &self,
        user: IdentityId,
    ) -> Result<Vec<Notification>, GatewayError>;

    /// Saves the full state of an existing notification (read-toggle).
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] if the notification does not exist,
    /// [`GatewayError::Persistence`] on store failure.
    async fn save_notification(&self, notification: &Notification) -> Result<(), GatewayError>;

    /// Deletes a notification.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] if the notification does not exist,
    /// [`GatewayError::Persistence`] on store failure.
    async fn delete_notification(&self, id: NotificationId) -> Result<(), GatewayError>;
}
