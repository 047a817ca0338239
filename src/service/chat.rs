//! Chat session state machine.
//!
//! Governs the `pending → active → resolved` lifecycle, enforces the
//! single-open-chat-per-user invariant (delegated to the store's atomic
//! conditional insert), and emits the real-time events for every
//! transition. Message-bearing events are dispatched strictly after the
//! persistence gateway reports success.

use std::sync::Arc;

use crate::domain::{ChannelId, Chat, ChatId, DispatchEvent, IdentityId, Message, Role};
use crate::error::GatewayError;
use crate::realtime::Dispatcher;
use crate::store::gateway::HistoryPage;
use crate::store::{MessageGateway, Store};

/// Orchestrates chat sessions.
#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<dyn Store>,
    gateway: MessageGateway,
    dispatcher: Arc<Dispatcher>,
}

impl ChatService {
    /// Creates a chat service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, gateway: MessageGateway, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            store,
            gateway,
            dispatcher,
        }
    }

    /// Opens a new chat session for `user`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for an empty category,
    /// [`GatewayError::Conflict`] if the user already has an open session.
    pub async fn create(&self, user: IdentityId, category: &str) -> Result<Chat, GatewayError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(GatewayError::Validation("category is required".to_string()));
        }

        let chat = self
            .store
            .insert_chat(Chat::new(user, category.to_string()))
            .await?;

        tracing::info!(chat_id = %chat.id, %user, category, "chat created");
        self.dispatcher
            .dispatch(DispatchEvent::NewChat { chat: chat.clone() })
            .await;
        Ok(chat)
    }

    /// Claims a pending chat for `admin` (socket `join_chat` from an admin
    /// connection).
    ///
    /// Idempotent for the already-assigned admin; dispatches
    /// `admin_joined` only when the chat actually transitioned.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] for an unknown chat,
    /// [`GatewayError::Conflict`] if another admin holds the session,
    /// [`GatewayError::ChatClosed`] if it is already resolved.
    pub async fn claim(&self, chat_id: ChatId, admin: IdentityId) -> Result<Chat, GatewayError> {
        let mut chat = self.load(chat_id).await?;
        let changed = chat.claim(admin)?;
        if changed {
            self.store.save_chat(&chat).await?;
            tracing::info!(%chat_id, %admin, "chat claimed");
            self.dispatcher
                .dispatch(DispatchEvent::AdminJoined { chat_id, admin })
                .await;
        }
        Ok(chat)
    }

    /// Resolves a chat. Admin-only; terminal.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Forbidden`] for non-admin callers,
    /// [`GatewayError::NotFound`] for an unknown chat,
    /// [`GatewayError::ChatClosed`] if already resolved.
    pub async fn resolve(
        &self,
        chat_id: ChatId,
        identity: IdentityId,
        role: Role,
    ) -> Result<Chat, GatewayError> {
        if !role.is_admin() {
            return Err(GatewayError::Forbidden(
                "only admins can resolve chats".to_string(),
            ));
        }

        let mut chat = self.load(chat_id).await?;
        chat.resolve()?;
        self.store.save_chat(&chat).await?;

        tracing::info!(%chat_id, admin = %identity, "chat resolved");
        self.dispatcher
            .dispatch(DispatchEvent::ChatResolved {
                chat_id,
                admin: identity,
            })
            .await;
        Ok(chat)
    }

    /// Sends a message into a chat session.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for empty content,
    /// [`GatewayError::NotFound`] for an unknown chat,
    /// [`GatewayError::ChatClosed`] for a resolved chat,
    /// [`GatewayError::Forbidden`] for a user who is not the chat's owner.
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        sender: IdentityId,
        role: Role,
        content: &str,
    ) -> Result<Message, GatewayError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(GatewayError::Validation("content is required".to_string()));
        }

        let chat = self.load(chat_id).await?;
        if !chat.status.is_open() {
            return Err(GatewayError::ChatClosed(*chat_id.as_uuid()));
        }
        if !chat.accessible_by(sender, role) {
            return Err(GatewayError::Forbidden(
                "you do not have access to this chat".to_string(),
            ));
        }

        let message = self
            .gateway
            .append_message(ChannelId::Chat(chat_id), sender, role, content.to_string())
            .await?;

        let event = if role.is_admin() {
            DispatchEvent::AdminResponse {
                message: message.clone(),
            }
        } else {
            DispatchEvent::NewMessage {
                message: message.clone(),
            }
        };
        self.dispatcher.dispatch(event).await;

        Ok(message)
    }

    /// Returns a chat and its full message log, access-checked.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] for an unknown chat,
    /// [`GatewayError::Forbidden`] for an identity without access.
    pub async fn get(
        &self,
        chat_id: ChatId,
        identity: IdentityId,
        role: Role,
    ) -> Result<(Chat, Vec<Message>), GatewayError> {
        let chat = self.load(chat_id).await?;
        if !chat.accessible_by(identity, role) {
            return Err(GatewayError::Forbidden(
                "you do not have access to this chat".to_string(),
            ));
        }
        let messages = self.gateway.messages_of(ChannelId::Chat(chat_id)).await?;
        Ok((chat, messages))
    }

    /// Returns paginated history for the calling identity.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Persistence`] on store failure.
    pub async fn history(
        &self,
        identity: IdentityId,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, GatewayError> {
        self.gateway.history_of(identity, page, page_size).await
    }

    async fn load(&self, chat_id: ChatId) -> Result<Chat, GatewayError> {
        self.store
            .chat(chat_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound("chat", chat_id.to_string()))
    }
}
