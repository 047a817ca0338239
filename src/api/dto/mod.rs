//! Request and response DTOs for the REST surface.

pub mod chat_dto;
pub mod common_dto;
pub mod message_dto;
pub mod notification_dto;

pub use chat_dto::{ChatDetailResponse, ChatDto, CreateChatRequest, HistoryEntryDto, HistoryResponse};
pub use common_dto::{PaginationMeta, PaginationParams};
pub use message_dto::{ConversationDto, MessageDto, RespondRequest, SendMessageRequest};
pub use notification_dto::{CreateNotificationRequest, NotificationDto};
