//! Conversation and message endpoint DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Conversation, Message};

/// Request body for a user message into their conversation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Message body.
    pub message: String,
}

/// Request body for an admin response into a conversation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RespondRequest {
    /// Target conversation.
    pub conversation_id: Uuid,
    /// Message body.
    pub message: String,
}

/// A persisted message as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageDto {
    /// Message identifier.
    pub id: Uuid,
    /// Sending identity.
    pub sender_id: Uuid,
    /// Role of the sender (`user` or `admin`).
    pub sender_role: String,
    /// Message body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: *message.id.as_uuid(),
            sender_id: *message.sender.as_uuid(),
            sender_role: message.sender_role.to_string(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// A conversation summary as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversationDto {
    /// Conversation identifier.
    pub id: Uuid,
    /// The user this conversation belongs to.
    pub user_id: Uuid,
    /// Text of the most recent message.
    pub last_message: String,
    /// Timestamp of the most recent message.
    pub last_message_time: DateTime<Utc>,
}

impl From<&Conversation> for ConversationDto {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: *conversation.id.as_uuid(),
            user_id: *conversation.user.as_uuid(),
            last_message: conversation.last_message.clone(),
            last_message_time: conversation.last_message_time,
        }
    }
}
