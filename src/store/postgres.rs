//! PostgreSQL implementation of the document-store seam.
//!
//! The single-open-chat invariant is enforced by a partial unique index on
//! `chats(user_id) WHERE status IN ('pending','active')`; concurrent
//! inserts for the same user serialize on the index and the loser maps to
//! a conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::Store;
use crate::config::GatewayConfig;
use crate::domain::{
    ChannelId, Chat, ChatId, ChatStatus, Conversation, ConversationId, IdentityId, Message,
    MessageId, Notification, NotificationId, Role,
};
use crate::error::GatewayError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

type ChatRow = (
    Uuid,
    Uuid,
    Option<Uuid>,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

type MessageRow = (Uuid, String, Uuid, Uuid, String, String, DateTime<Utc>);

type NotificationRow = (Uuid, Option<Uuid>, String, String, bool, DateTime<Utc>);

impl PostgresStore {
    /// Connects to PostgreSQL and bootstraps the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] if the pool cannot be
    /// created or the schema statements fail.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Creates a store over an existing pool (tests, embedded setups).
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn init_schema(&self) -> Result<(), GatewayError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS chats (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL,
                admin_id UUID,
                status TEXT NOT NULL,
                category TEXT NOT NULL,
                last_message TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_chats_open_per_user
                ON chats (user_id) WHERE status IN ('pending', 'active')",
            "CREATE TABLE IF NOT EXISTS conversations (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL UNIQUE,
                last_message TEXT NOT NULL,
                last_message_time TIMESTAMPTZ NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS messages (
                seq BIGSERIAL PRIMARY KEY,
                id UUID NOT NULL,
                channel_kind TEXT NOT NULL,
                channel_id UUID NOT NULL,
                sender_id UUID NOT NULL,
                sender_role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_messages_channel
                ON messages (channel_kind, channel_id, seq)",
            "CREATE TABLE IF NOT EXISTS notifications (
                id UUID PRIMARY KEY,
                target_id UUID,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                is_read BOOLEAN NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        ];
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| GatewayError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}

fn persistence(e: sqlx::Error) -> GatewayError {
    GatewayError::Persistence(e.to_string())
}

fn parse_status(s: &str) -> Result<ChatStatus, GatewayError> {
    match s {
        "pending" => Ok(ChatStatus::Pending),
        "active" => Ok(ChatStatus::Active),
        "resolved" => Ok(ChatStatus::Resolved),
        other => Err(GatewayError::Persistence(format!(
            "unknown chat status in store: {other}"
        ))),
    }
}

fn parse_role(s: &str) -> Result<Role, GatewayError> {
    match s {
        "user" => Ok(Role::User),
        "admin" => Ok(Role::Admin),
        other => Err(GatewayError::Persistence(format!(
            "unknown role in store: {other}"
        ))),
    }
}

fn channel_columns(channel: ChannelId) -> (&'static str, Uuid) {
    match channel {
        ChannelId::Chat(id) => ("chat", *id.as_uuid()),
        ChannelId::Conversation(id) => ("conversation", *id.as_uuid()),
    }
}

fn parse_channel(kind: &str, id: Uuid) -> Result<ChannelId, GatewayError> {
    match kind {
        "chat" => Ok(ChannelId::Chat(ChatId::from_uuid(id))),
        "conversation" => Ok(ChannelId::Conversation(ConversationId::from_uuid(id))),
        other => Err(GatewayError::Persistence(format!(
            "unknown channel kind in store: {other}"
        ))),
    }
}

fn chat_from_row(row: ChatRow) -> Result<Chat, GatewayError> {
    let (id, user_id, admin_id, status, category, last_message, created_at) = row;
    Ok(Chat {
        id: ChatId::from_uuid(id),
        user: IdentityId::from_uuid(user_id),
        admin: admin_id.map(IdentityId::from_uuid),
        status: parse_status(&status)?,
        category,
        last_message,
        created_at,
    })
}

fn message_from_row(row: MessageRow) -> Result<Message, GatewayError> {
    let (id, channel_kind, channel_id, sender_id, sender_role, content, created_at) = row;
    Ok(Message {
        id: MessageId::from_uuid(id),
        sender: IdentityId::from_uuid(sender_id),
        sender_role: parse_role(&sender_role)?,
        content,
        channel: parse_channel(&channel_kind, channel_id)?,
        created_at,
    })
}

fn notification_from_row(row: NotificationRow) -> Notification {
    let (id, target_id, title, description, is_read, created_at) = row;
    Notification {
        id: NotificationId::from_uuid(id),
        target: target_id.map(IdentityId::from_uuid),
        title,
        description,
        read: is_read,
        created_at,
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_chat(&self, chat: Chat) -> Result<Chat, GatewayError> {
        let result = sqlx::query(
            "INSERT INTO chats (id, user_id, admin_id, status, category, last_message, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(chat.id.as_uuid())
        .bind(chat.user.as_uuid())
        .bind(chat.admin.map(|a| *a.as_uuid()))
        .bind(chat.status.as_str())
        .bind(&chat.category)
        .bind(chat.last_message)
        .bind(chat.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(chat),
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                Err(GatewayError::Conflict(format!(
                    "user {} already has an open chat session",
                    chat.user
                )))
            }
            Err(e) => Err(persistence(e)),
        }
    }

    async fn chat(&self, id: ChatId) -> Result<Option<Chat>, GatewayError> {
        let row = sqlx::query_as::<_, ChatRow>(
            "SELECT id, user_id, admin_id, status, category, last_message, created_at \
             FROM chats WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        row.map(chat_from_row).transpose()
    }

    async fn save_chat(&self, chat: &Chat) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "UPDATE chats SET admin_id = $2, status = $3, category = $4, last_message = $5 \
             WHERE id = $1",
        )
        .bind(chat.id.as_uuid())
        .bind(chat.admin.map(|a| *a.as_uuid()))
        .bind(chat.status.as_str())
        .bind(&chat.category)
        .bind(chat.last_message)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound("chat", chat.id.to_string()));
        }
        Ok(())
    }

    async fn chats_for(&self, identity: IdentityId) -> Result<Vec<Chat>, GatewayError> {
        let rows = sqlx::query_as::<_, ChatRow>(
            "SELECT id, user_id, admin_id, status, category, last_message, created_at \
             FROM chats WHERE user_id = $1 OR admin_id = $1 ORDER BY last_message DESC",
        )
        .bind(identity.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter().map(chat_from_row).collect()
    }

    async fn conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            "SELECT id, user_id, last_message, last_message_time FROM conversations WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(|(id, user_id, last_message, last_message_time)| Conversation {
            id: ConversationId::from_uuid(id),
            user: IdentityId::from_uuid(user_id),
            last_message,
            last_message_time,
        }))
    }

    async fn conversation_for_user(
        &self,
        user: IdentityId,
    ) -> Result<Option<Conversation>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            "SELECT id, user_id, last_message, last_message_time FROM conversations \
             WHERE user_id = $1",
        )
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(|(id, user_id, last_message, last_message_time)| Conversation {
            id: ConversationId::from_uuid(id),
            user: IdentityId::from_uuid(user_id),
            last_message,
            last_message_time,
        }))
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO conversations (id, user_id, last_message, last_message_time) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE \
             SET last_message = $3, last_message_time = $4",
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.user.as_uuid())
        .bind(&conversation.last_message)
        .bind(conversation.last_message_time)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }

    async fn conversations(&self) -> Result<Vec<Conversation>, GatewayError> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            "SELECT id, user_id, last_message, last_message_time FROM conversations \
             ORDER BY last_message_time DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, last_message, last_message_time)| Conversation {
                id: ConversationId::from_uuid(id),
                user: IdentityId::from_uuid(user_id),
                last_message,
                last_message_time,
            })
            .collect())
    }

    async fn append_message(&self, message: &Message) -> Result<(), GatewayError> {
        let (kind, channel_id) = channel_columns(message.channel);
        sqlx::query(
            "INSERT INTO messages \
             (id, channel_kind, channel_id, sender_id, sender_role, content, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(message.id.as_uuid())
        .bind(kind)
        .bind(channel_id)
        .bind(message.sender.as_uuid())
        .bind(message.sender_role.to_string())
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }

    async fn messages_of(&self, channel: ChannelId) -> Result<Vec<Message>, GatewayError> {
        let (kind, channel_id) = channel_columns(channel);
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, channel_kind, channel_id, sender_id, sender_role, content, created_at \
             FROM messages WHERE channel_kind = $1 AND channel_id = $2 ORDER BY seq ASC",
        )
        .bind(kind)
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter().map(message_from_row).collect()
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO notifications (id, target_id, title, description, is_read, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(notification.id.as_uuid())
        .bind(notification.target.map(|t| *t.as_uuid()))
        .bind(&notification.title)
        .bind(&notification.description)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }

    async fn notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, GatewayError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, target_id, title, description, is_read, created_at \
             FROM notifications WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(notification_from_row))
    }

    async fn notifications(&self) -> Result<Vec<Notification>, GatewayError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, target_id, title, description, is_read, created_at \
             FROM notifications ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows.into_iter().map(notification_from_row).collect())
    }

    async fn notifications_for(
        &self,
        user: IdentityId,
    ) -> Result<Vec<Notification>, GatewayError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, target_id, title, description, is_read, created_at \
             FROM notifications WHERE target_id = $1 OR target_id IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows.into_iter().map(notification_from_row).collect())
    }

    async fn save_notification(&self, notification: &Notification) -> Result<(), GatewayError> {
        let result = sqlx::query("UPDATE notifications SET is_read = $2 WHERE id = $1")
            .bind(notification.id.as_uuid())
            .bind(notification.read)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound(
                "notification",
                notification.id.to_string(),
            ));
        }
        Ok(())
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound("notification", id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_and_role_parsing_round_trips() {
        for status in [ChatStatus::Pending, ChatStatus::Active, ChatStatus::Resolved] {
            assert_eq!(parse_status(status.as_str()).ok(), Some(status));
        }
        assert!(parse_status("archived").is_err());

        for role in [Role::User, Role::Admin] {
            assert_eq!(parse_role(&role.to_string()).ok(), Some(role));
        }
        assert!(parse_role("root").is_err());
    }

    #[test]
    fn channel_columns_round_trip() {
        let chat = ChannelId::Chat(ChatId::new());
        let (kind, id) = channel_columns(chat);
        assert_eq!(parse_channel(kind, id).ok(), Some(chat));

        let convo = ChannelId::Conversation(ConversationId::new());
        let (kind, id) = channel_columns(convo);
        assert_eq!(parse_channel(kind, id).ok(), Some(convo));

        assert!(parse_channel("queue", Uuid::new_v4()).is_err());
    }
}
