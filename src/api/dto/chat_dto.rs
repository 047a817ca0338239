//! Chat endpoint DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::PaginationMeta;
use super::message_dto::{ConversationDto, MessageDto};
use crate::domain::Chat;
use crate::store::gateway::{HistoryEntry, HistoryPage};

/// Request body for opening a chat session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateChatRequest {
    /// Free-form category (e.g. `"billing"`).
    pub category: String,
}

/// A chat session as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatDto {
    /// Chat identifier.
    pub id: Uuid,
    /// The user who opened the session.
    pub user_id: Uuid,
    /// The assigned admin, if claimed.
    pub admin_id: Option<Uuid>,
    /// Lifecycle state (`pending`, `active`, `resolved`).
    pub status: String,
    /// Category supplied on creation.
    pub category: String,
    /// Timestamp of the most recent message.
    pub last_message: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Chat> for ChatDto {
    fn from(chat: &Chat) -> Self {
        Self {
            id: *chat.id.as_uuid(),
            user_id: *chat.user.as_uuid(),
            admin_id: chat.admin.map(|a| *a.as_uuid()),
            status: chat.status.as_str().to_string(),
            category: chat.category.clone(),
            last_message: chat.last_message,
            created_at: chat.created_at,
        }
    }
}

/// A chat together with its full message log.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatDetailResponse {
    /// The chat record.
    pub chat: ChatDto,
    /// Ordered message log, oldest first.
    pub messages: Vec<MessageDto>,
}

/// One entry of the caller's history: either subsystem's channel.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntryDto {
    /// A support chat session.
    Chat(ChatDto),
    /// A lightweight conversation.
    Conversation(ConversationDto),
}

/// Paginated history response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    /// Entries on this page, most recent activity first.
    pub data: Vec<HistoryEntryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

impl HistoryResponse {
    /// Builds the response from a gateway history page.
    #[must_use]
    pub fn from_page(page: HistoryPage, per_page: u32) -> Self {
        let data = page
            .entries
            .iter()
            .map(|entry| match entry {
                HistoryEntry::Chat(chat) => HistoryEntryDto::Chat(ChatDto::from(chat)),
                HistoryEntry::Conversation(conversation) => {
                    HistoryEntryDto::Conversation(ConversationDto::from(conversation))
                }
            })
            .collect();
        Self {
            data,
            pagination: PaginationMeta {
                page: page.page,
                per_page,
                total: page.total,
                total_pages: page.pages,
            },
        }
    }
}
