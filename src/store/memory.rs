//! In-memory store for tests and local development.
//!
//! Single `RwLock` over all collections: `insert_chat`'s check-and-insert
//! runs entirely inside one write-lock section, which is what makes the
//! single-open-chat invariant hold under concurrent creates.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::domain::{
    ChannelId, Chat, ChatId, Conversation, ConversationId, IdentityId, Message, Notification,
    NotificationId,
};
use crate::error::GatewayError;

/// Volatile document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

#[derive(Debug, Default)]
struct Collections {
    chats: HashMap<ChatId, Chat>,
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ChannelId, Vec<Message>>,
    notifications: HashMap<NotificationId, Notification>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_chat(&self, chat: Chat) -> Result<Chat, GatewayError> {
        let mut inner = self.inner.write().await;
        let open_exists = inner
            .chats
            .values()
            .any(|c| c.user == chat.user && c.status.is_open());
        if open_exists {
            return Err(GatewayError::Conflict(format!(
                "user {} already has an open chat session",
                chat.user
            )));
        }
        inner.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn chat(&self, id: ChatId) -> Result<Option<Chat>, GatewayError> {
        Ok(self.inner.read().await.chats.get(&id).cloned())
    }

    async fn save_chat(&self, chat: &Chat) -> Result<(), GatewayError> {
        let mut inner = self.inner.write().await;
        if !inner.chats.contains_key(&chat.id) {
            return Err(GatewayError::NotFound("chat", chat.id.to_string()));
        }
        inner.chats.insert(chat.id, chat.clone());
        Ok(())
    }

    async fn chats_for(&self, identity: IdentityId) -> Result<Vec<Chat>, GatewayError> {
        let inner = self.inner.read().await;
        let mut chats: Vec<Chat> = inner
            .chats
            .values()
            .filter(|c| c.user == identity || c.admin == Some(identity))
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.last_message.cmp(&a.last_message));
        Ok(chats)
    }

    async fn conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, GatewayError> {
        Ok(self.inner.read().await.conversations.get(&id).cloned())
    }

    async fn conversation_for_user(
        &self,
        user: IdentityId,
    ) -> Result<Option<Conversation>, GatewayError> {
        Ok(self
            .inner
            .read()
            .await
            .conversations
            .values()
            .find(|c| c.user == user)
            .cloned())
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), GatewayError> {
        self.inner
            .write()
            .await
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn conversations(&self) -> Result<Vec<Conversation>, GatewayError> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> =
            inner.conversations.values().cloned().collect();
        conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(conversations)
    }

    async fn append_message(&self, message: &Message) -> Result<(), GatewayError> {
        self.inner
            .write()
            .await
            .messages
            .entry(message.channel)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn messages_of(&self, channel: ChannelId) -> Result<Vec<Message>, GatewayError> {
        // Append order is creation order: the log per channel is already
        // ascending.
        Ok(self
            .inner
            .read()
            .await
            .messages
            .get(&channel)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), GatewayError> {
        self.inner
            .write()
            .await
            .notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, GatewayError> {
        Ok(self.inner.read().await.notifications.get(&id).cloned())
    }

    async fn notifications(&self) -> Result<Vec<Notification>, GatewayError> {
        let inner = self.inner.read().await;
        let mut all: Vec<Notification> = inner.notifications.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn notifications_for(
        &self,
        user: IdentityId,
    ) -> Result<Vec<Notification>, GatewayError> {
        let inner = self.inner.read().await;
        let mut visible: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|n| n.visible_to(user))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }

    async fn save_notification(&self, notification: &Notification) -> Result<(), GatewayError> {
        let mut inner = self.inner.write().await;
        if !inner.notifications.contains_key(&notification.id) {
            return Err(GatewayError::NotFound(
                "notification",
                notification.id.to_string(),
            ));
        }
        inner
            .notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<(), GatewayError> {
        let mut inner = self.inner.write().await;
        inner
            .notifications
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::NotFound("notification", id.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use std::sync::Arc;

    #[tokio::test]
    async fn insert_chat_enforces_single_open_session() {
        let store = MemoryStore::new();
        let user = IdentityId::new();

        let first = store.insert_chat(Chat::new(user, "billing".to_string())).await;
        assert!(first.is_ok());

        let second = store.insert_chat(Chat::new(user, "prizes".to_string())).await;
        assert!(matches!(second, Err(GatewayError::Conflict(_))));
    }

    #[tokio::test]
    async fn resolved_chat_allows_a_new_session() {
        let store = MemoryStore::new();
        let user = IdentityId::new();

        let Ok(mut chat) = store.insert_chat(Chat::new(user, "billing".to_string())).await
        else {
            panic!("insert failed");
        };
        assert!(chat.resolve().is_ok());
        assert!(store.save_chat(&chat).await.is_ok());

        let second = store.insert_chat(Chat::new(user, "prizes".to_string())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn concurrent_creates_admit_exactly_one() {
        let store = Arc::new(MemoryStore::new());
        let user = IdentityId::new();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_chat(Chat::new(user, "stress".to_string())).await
            }));
        }

        let mut created = 0usize;
        let mut conflicts = 0usize;
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("task panicked");
            };
            match result {
                Ok(_) => created += 1,
                Err(GatewayError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, 31);
    }

    #[tokio::test]
    async fn save_chat_requires_existing_record() {
        let store = MemoryStore::new();
        let chat = Chat::new(IdentityId::new(), "billing".to_string());
        let result = store.save_chat(&chat).await;
        assert!(matches!(result, Err(GatewayError::NotFound(_, _))));
    }

    #[tokio::test]
    async fn chats_for_matches_user_or_admin_sorted_desc() {
        let store = MemoryStore::new();
        let user = IdentityId::new();
        let admin = IdentityId::new();

        let Ok(mut chat) = store.insert_chat(Chat::new(user, "a".to_string())).await else {
            panic!("insert failed");
        };
        let _ = chat.claim(admin);
        assert!(chat.resolve().is_ok());
        assert!(store.save_chat(&chat).await.is_ok());

        let Ok(newer) = store.insert_chat(Chat::new(user, "b".to_string())).await else {
            panic!("insert failed");
        };

        let for_user = store.chats_for(user).await.unwrap_or_default();
        assert_eq!(for_user.len(), 2);
        assert_eq!(for_user.first().map(|c| c.id), Some(newer.id));

        let for_admin = store.chats_for(admin).await.unwrap_or_default();
        assert_eq!(for_admin.len(), 1);
        assert_eq!(for_admin.first().map(|c| c.id), Some(chat.id));
    }

    #[tokio::test]
    async fn messages_keep_append_order_per_channel() {
        let store = MemoryStore::new();
        let channel = ChannelId::Chat(ChatId::new());
        let sender = IdentityId::new();

        for i in 0..5 {
            let msg = Message::new(channel, sender, Role::User, format!("m{i}"));
            assert!(store.append_message(&msg).await.is_ok());
        }

        let log = store.messages_of(channel).await.unwrap_or_default();
        let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn notifications_visibility_and_delete() {
        let store = MemoryStore::new();
        let user = IdentityId::new();

        let broadcast = Notification::broadcast("all".to_string(), "hands".to_string());
        let targeted = Notification::targeted(user, "you".to_string(), "won".to_string());
        let other = Notification::targeted(IdentityId::new(), "not".to_string(), "you".to_string());
        for n in [&broadcast, &targeted, &other] {
            assert!(store.insert_notification(n).await.is_ok());
        }

        let visible = store.notifications_for(user).await.unwrap_or_default();
        assert_eq!(visible.len(), 2);

        assert!(store.delete_notification(targeted.id).await.is_ok());
        assert!(matches!(
            store.delete_notification(targeted.id).await,
            Err(GatewayError::NotFound(_, _))
        ));
    }
}
