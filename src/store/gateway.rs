//! Message persistence gateway.
//!
//! Single writer for the append-only message log plus the cached summary
//! projections on chats and conversations. The append and the summary
//! update are one logical unit: if the summary write fails after the
//! message landed, the gateway retries once and logs the final failure —
//! the inconsistency is never silent.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::Store;
use crate::domain::{ChannelId, Chat, Conversation, IdentityId, Message, Role};
use crate::error::GatewayError;

/// One page of chat/conversation history for an identity.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    /// Entries on this page, most recent activity first.
    pub entries: Vec<HistoryEntry>,
    /// Total entries across all pages.
    pub total: u64,
    /// The 1-indexed page number served.
    pub page: u32,
    /// Total number of pages.
    pub pages: u32,
}

/// A single history entry: either subsystem's channel.
#[derive(Debug, Clone)]
pub enum HistoryEntry {
    /// A support chat session.
    Chat(Chat),
    /// A lightweight conversation.
    Conversation(Conversation),
}

impl HistoryEntry {
    /// Timestamp of the channel's most recent activity.
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        match self {
            Self::Chat(chat) => chat.last_message,
            Self::Conversation(convo) => convo.last_message_time,
        }
    }
}

/// Append-only writer and history reader over the document store.
#[derive(Debug, Clone)]
pub struct MessageGateway {
    store: Arc<dyn Store>,
}

impl MessageGateway {
    /// Creates a gateway over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends a message to `channel` and bumps the owning record's
    /// summary fields.
    ///
    /// The real-time event for this message must only be emitted after
    /// this returns `Ok`: the returned [`Message`] is the persisted
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] if the message append itself
    /// fails. A summary-update failure is logged and retried, not
    /// surfaced: the message is already durable at that point.
    pub async fn append_message(
        &self,
        channel: ChannelId,
        sender: IdentityId,
        sender_role: Role,
        content: String,
    ) -> Result<Message, GatewayError> {
        let message = Message::new(channel, sender, sender_role, content);
        self.store.append_message(&message).await?;

        if let Err(err) = self.update_summary(&message).await {
            tracing::warn!(channel = %channel, %err, "summary update failed, retrying");
            if let Err(err) = self.update_summary(&message).await {
                tracing::error!(
                    channel = %channel,
                    message_id = %message.id,
                    %err,
                    "summary update failed after retry; summary is stale"
                );
            }
        }

        Ok(message)
    }

    async fn update_summary(&self, message: &Message) -> Result<(), GatewayError> {
        match message.channel {
            ChannelId::Chat(chat_id) => {
                let mut chat = self
                    .store
                    .chat(chat_id)
                    .await?
                    .ok_or_else(|| GatewayError::NotFound("chat", chat_id.to_string()))?;
                chat.last_message = message.created_at;
                self.store.save_chat(&chat).await
            }
            ChannelId::Conversation(conversation_id) => {
                let mut conversation = self
                    .store
                    .conversation(conversation_id)
                    .await?
                    .ok_or_else(|| {
                        GatewayError::NotFound("conversation", conversation_id.to_string())
                    })?;
                conversation.last_message = message.content.clone();
                conversation.last_message_time = message.created_at;
                self.store.save_conversation(&conversation).await
            }
        }
    }

    /// Returns the full message log of `channel`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    pub async fn messages_of(&self, channel: ChannelId) -> Result<Vec<Message>, GatewayError> {
        self.store.messages_of(channel).await
    }

    /// Returns one page of channels where `identity` participates, sorted
    /// by most recent activity descending.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    pub async fn history_of(
        &self,
        identity: IdentityId,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, GatewayError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        let mut entries: Vec<HistoryEntry> = self
            .store
            .chats_for(identity)
            .await?
            .into_iter()
            .map(HistoryEntry::Chat)
            .collect();
        if let Some(conversation) = self.store.conversation_for_user(identity).await? {
            entries.push(HistoryEntry::Conversation(conversation));
        }
        entries.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));

        let total = entries.len() as u64;
        let pages = if total == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        };

        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let entries = entries
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Ok(HistoryPage {
            entries,
            total,
            page,
            pages,
        })
    }
}
