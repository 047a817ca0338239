//! Lightweight conversation channel service.
//!
//! One conversation per user, created lazily on the first message. Users
//! send into their own conversation; any admin may respond. Dashboards
//! list all conversations sorted by recency.

use std::sync::Arc;

use crate::domain::{ChannelId, Conversation, ConversationId, DispatchEvent, IdentityId, Message, Role};
use crate::error::GatewayError;
use crate::realtime::Dispatcher;
use crate::store::{MessageGateway, Store};

/// Orchestrates conversation channels.
#[derive(Debug, Clone)]
pub struct ConversationService {
    store: Arc<dyn Store>,
    gateway: MessageGateway,
    dispatcher: Arc<Dispatcher>,
}

impl ConversationService {
    /// Creates a conversation service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, gateway: MessageGateway, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            store,
            gateway,
            dispatcher,
        }
    }

    /// Sends a user message, lazily creating the user's conversation.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for empty content,
    /// [`GatewayError::Persistence`] on store failure.
    pub async fn send(&self, user: IdentityId, content: &str) -> Result<Message, GatewayError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(GatewayError::Validation("message is required".to_string()));
        }

        let conversation = match self.store.conversation_for_user(user).await? {
            Some(existing) => existing,
            None => {
                let fresh = Conversation::new(user);
                self.store.save_conversation(&fresh).await?;
                tracing::info!(conversation_id = %fresh.id, %user, "conversation created");
                fresh
            }
        };

        let message = self
            .gateway
            .append_message(
                ChannelId::Conversation(conversation.id),
                user,
                Role::User,
                content.to_string(),
            )
            .await?;

        self.dispatcher
            .dispatch(DispatchEvent::NewMessage {
                message: message.clone(),
            })
            .await;
        Ok(message)
    }

    /// Admin response into an existing conversation.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Forbidden`] for non-admin callers,
    /// [`GatewayError::Validation`] for empty content,
    /// [`GatewayError::NotFound`] for an unknown conversation.
    pub async fn respond(
        &self,
        admin: IdentityId,
        role: Role,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Message, GatewayError> {
        if !role.is_admin() {
            return Err(GatewayError::Forbidden(
                "only admins can respond to conversations".to_string(),
            ));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(GatewayError::Validation("message is required".to_string()));
        }

        let conversation = self
            .store
            .conversation(conversation_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound("conversation", conversation_id.to_string()))?;

        let message = self
            .gateway
            .append_message(
                ChannelId::Conversation(conversation.id),
                admin,
                Role::Admin,
                content.to_string(),
            )
            .await?;

        self.dispatcher
            .dispatch(DispatchEvent::AdminResponse {
                message: message.clone(),
            })
            .await;
        Ok(message)
    }

    /// Lists every conversation, newest activity first (admin dashboard).
    ///
    /// # Errors
    ///
    /// [`GatewayError::Forbidden`] for non-admin callers,
    /// [`GatewayError::Persistence`] on store failure.
    pub async fn list(&self, role: Role) -> Result<Vec<Conversation>, GatewayError> {
        if !role.is_admin() {
            return Err(GatewayError::Forbidden(
                "only admins can list conversations".to_string(),
            ));
        }
        self.store.conversations().await
    }

    /// Returns the ordered message log of a conversation.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] for an unknown conversation.
    pub async fn messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, GatewayError> {
        if self.store.conversation(conversation_id).await?.is_none() {
            return Err(GatewayError::NotFound(
                "conversation",
                conversation_id.to_string(),
            ));
        }
        self.gateway
            .messages_of(ChannelId::Conversation(conversation_id))
            .await
    }

    /// Returns the message log of a user's conversation.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] if the user has no conversation yet.
    pub async fn messages_for_user(&self, user: IdentityId) -> Result<Vec<Message>, GatewayError> {
        let conversation = self
            .store
            .conversation_for_user(user)
            .await?
            .ok_or_else(|| GatewayError::NotFound("conversation", user.to_string()))?;
        self.gateway
            .messages_of(ChannelId::Conversation(conversation.id))
            .await
    }
}
