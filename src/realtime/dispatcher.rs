//! Real-time notification dispatcher.
//!
//! Owns the routing rules: which connections hear about which event. The
//! two legacy socket services each carried half of these rules with
//! conflicting conventions; this is the single reconciled implementation.
//!
//! Delivery is best-effort. An unreachable client simply misses the event;
//! emission failures are never escalated to the caller.

use std::sync::Arc;

use crate::domain::{ChannelId, ConnectionId, DispatchEvent, Message, Role, RoomId};
use crate::realtime::registry::ConnectionRegistry;
use crate::realtime::rooms::RoomManager;
use crate::ws::messages::ServerEvent;

/// Routes dispatch events to live connections.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given registry and room manager.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, rooms: Arc<RoomManager>) -> Self {
        Self { registry, rooms }
    }

    /// Fans `event` out according to the routing rules.
    ///
    /// Message-bearing events must only be dispatched after persistence
    /// succeeded; that contract is enforced by the callers (services),
    /// which hold the persisted record before dispatching.
    pub async fn dispatch(&self, event: DispatchEvent) {
        match event {
            DispatchEvent::NewChat { chat } => {
                // Admin room only; never echoed to the originating user.
                self.to_room(
                    RoomId::Admins,
                    None,
                    ServerEvent::NewChat {
                        chat_id: chat.id,
                        user_id: chat.user,
                        category: chat.category,
                    },
                )
                .await;
            }

            DispatchEvent::NewMessage { message } => {
                let update = summary_update(&message.channel, &message);
                self.to_role(
                    Role::Admin,
                    ServerEvent::NewMessage {
                        message: message.clone(),
                    },
                )
                .await;
                self.to_all(update).await;
            }

            DispatchEvent::AdminResponse { message } => {
                let update = summary_update(&message.channel, &message);
                self.to_room(
                    message.channel.room(),
                    None,
                    ServerEvent::AdminResponse {
                        message: message.clone(),
                    },
                )
                .await;
                self.to_all(update).await;
            }

            DispatchEvent::AdminJoined { chat_id, admin } => {
                self.to_room(
                    RoomId::Chat(chat_id),
                    None,
                    ServerEvent::AdminJoined {
                        chat_id,
                        admin_id: admin,
                    },
                )
                .await;
            }

            DispatchEvent::ChatResolved { chat_id, admin } => {
                self.to_room(
                    RoomId::Chat(chat_id),
                    None,
                    ServerEvent::ChatResolved {
                        chat_id,
                        admin_id: admin,
                    },
                )
                .await;
            }

            DispatchEvent::Typing {
                chat_id,
                sender_connection,
                sender,
                role,
            } => {
                let frame = match role {
                    Role::Admin => ServerEvent::AdminTyping {
                        chat_id,
                        admin_id: sender,
                    },
                    Role::User => ServerEvent::UserTyping {
                        chat_id,
                        user_id: sender,
                    },
                };
                self.to_room(RoomId::Chat(chat_id), Some(sender_connection), frame)
                    .await;
            }

            DispatchEvent::Notification { notification } => {
                let frame = ServerEvent::Notification {
                    id: notification.id,
                    title: notification.title,
                    description: notification.description,
                };
                match notification.target {
                    Some(user) => {
                        if let Some(handle) = self.registry.lookup(user, Role::User).await {
                            handle.send(frame);
                        }
                    }
                    None => self.to_role(Role::User, frame).await,
                }
            }
        }
    }

    /// Emits to every member of `room`, optionally excluding one
    /// connection (typing events never echo to their sender).
    async fn to_room(&self, room: RoomId, exclude: Option<ConnectionId>, event: ServerEvent) {
        let members = self.rooms.members_of(room).await;
        let mut delivered = 0usize;
        for member in members {
            if Some(member) == exclude {
                continue;
            }
            if let Some(handle) = self.registry.get(member).await {
                handle.send(event.clone());
                delivered += 1;
            }
        }
        tracing::trace!(room = %room, delivered, "room fan-out");
    }

    /// Emits to every connection registered under `role`.
    async fn to_role(&self, role: Role, event: ServerEvent) {
        let handles = self.registry.with_role(role).await;
        for handle in &handles {
            handle.send(event.clone());
        }
        tracing::trace!(%role, delivered = handles.len(), "role fan-out");
    }

    /// Emits to every live connection (dashboard summary refreshes).
    async fn to_all(&self, event: ServerEvent) {
        for handle in self.registry.all().await {
            handle.send(event.clone());
        }
    }
}

/// Derives the `conversation_update` broadcast from a persisted message.
fn summary_update(channel: &ChannelId, message: &Message) -> ServerEvent {
    ServerEvent::ConversationUpdate {
        channel: *channel,
        last_message: message.content.clone(),
        last_message_time: message.created_at,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Chat, ChatId, IdentityId, Notification};
    use crate::realtime::registry::ConnectionHandle;
    use tokio::sync::mpsc;

    struct Fixture {
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomManager>,
        dispatcher: Dispatcher,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(ConnectionRegistry::new());
            let rooms = Arc::new(RoomManager::new());
            let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&rooms));
            Self {
                registry,
                rooms,
                dispatcher,
            }
        }

        async fn connect(
            &self,
            role: Role,
        ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
            let (tx, rx) = mpsc::channel(16);
            let handle = Arc::new(ConnectionHandle::new(IdentityId::new(), role, tx));
            let _ = self.registry.register(Arc::clone(&handle)).await;
            if role.is_admin() {
                self.rooms.join(handle.id, RoomId::Admins).await;
            }
            (handle, rx)
        }
    }

    fn chat_message(chat_id: ChatId, sender: IdentityId, role: Role) -> Message {
        Message::new(
            ChannelId::Chat(chat_id),
            sender,
            role,
            "hello".to_string(),
        )
    }

    #[tokio::test]
    async fn new_chat_reaches_admins_not_the_user() {
        let fx = Fixture::new();
        let (_admin, mut admin_rx) = fx.connect(Role::Admin).await;
        let (user, mut user_rx) = fx.connect(Role::User).await;

        let chat = Chat::new(user.identity, "billing".to_string());
        let chat_id = chat.id;
        fx.dispatcher.dispatch(DispatchEvent::NewChat { chat }).await;

        let Ok(ServerEvent::NewChat { chat_id: got, .. }) = admin_rx.try_recv() else {
            panic!("admin should receive new_chat");
        };
        assert_eq!(got, chat_id);
        assert!(user_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn new_message_broadcasts_to_admins_with_summary_update() {
        let fx = Fixture::new();
        let (_a1, mut rx1) = fx.connect(Role::Admin).await;
        let (_a2, mut rx2) = fx.connect(Role::Admin).await;
        let (user, mut user_rx) = fx.connect(Role::User).await;

        let message = chat_message(ChatId::new(), user.identity, Role::User);
        fx.dispatcher
            .dispatch(DispatchEvent::NewMessage { message })
            .await;

        for rx in [&mut rx1, &mut rx2] {
            assert!(matches!(rx.try_recv(), Ok(ServerEvent::NewMessage { .. })));
            assert!(matches!(
                rx.try_recv(),
                Ok(ServerEvent::ConversationUpdate { .. })
            ));
        }
        // The user is not an admin: only the global summary update arrives.
        assert!(matches!(
            user_rx.try_recv(),
            Ok(ServerEvent::ConversationUpdate { .. })
        ));
        assert!(user_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn admin_response_goes_to_room_and_refreshes_dashboards() {
        let fx = Fixture::new();
        let (admin, mut admin_rx) = fx.connect(Role::Admin).await;
        let (user, mut user_rx) = fx.connect(Role::User).await;
        let (_outsider, mut outsider_rx) = fx.connect(Role::User).await;

        let chat_id = ChatId::new();
        fx.rooms.join(user.id, RoomId::Chat(chat_id)).await;

        let message = chat_message(chat_id, admin.identity, Role::Admin);
        fx.dispatcher
            .dispatch(DispatchEvent::AdminResponse { message })
            .await;

        assert!(matches!(
            user_rx.try_recv(),
            Ok(ServerEvent::AdminResponse { .. })
        ));
        assert!(matches!(
            user_rx.try_recv(),
            Ok(ServerEvent::ConversationUpdate { .. })
        ));
        // Outside the room: only the global summary refresh.
        assert!(matches!(
            outsider_rx.try_recv(),
            Ok(ServerEvent::ConversationUpdate { .. })
        ));
        assert!(outsider_rx.try_recv().is_err());
        // The admin is not in the chat room here, so no admin_response echo.
        assert!(matches!(
            admin_rx.try_recv(),
            Ok(ServerEvent::ConversationUpdate { .. })
        ));
    }

    #[tokio::test]
    async fn typing_never_echoes_to_sender() {
        let fx = Fixture::new();
        let (a, mut a_rx) = fx.connect(Role::User).await;
        let (b, mut b_rx) = fx.connect(Role::User).await;

        let chat_id = ChatId::new();
        fx.rooms.join(a.id, RoomId::Chat(chat_id)).await;
        fx.rooms.join(b.id, RoomId::Chat(chat_id)).await;

        fx.dispatcher
            .dispatch(DispatchEvent::Typing {
                chat_id,
                sender_connection: a.id,
                sender: a.identity,
                role: Role::User,
            })
            .await;

        assert!(matches!(
            b_rx.try_recv(),
            Ok(ServerEvent::UserTyping { .. })
        ));
        assert!(a_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn resolved_and_joined_stay_in_the_room() {
        let fx = Fixture::new();
        let (member, mut member_rx) = fx.connect(Role::User).await;
        let (_outsider, mut outsider_rx) = fx.connect(Role::User).await;

        let chat_id = ChatId::new();
        fx.rooms.join(member.id, RoomId::Chat(chat_id)).await;

        let admin = IdentityId::new();
        fx.dispatcher
            .dispatch(DispatchEvent::AdminJoined { chat_id, admin })
            .await;
        fx.dispatcher
            .dispatch(DispatchEvent::ChatResolved { chat_id, admin })
            .await;

        assert!(matches!(
            member_rx.try_recv(),
            Ok(ServerEvent::AdminJoined { .. })
        ));
        assert!(matches!(
            member_rx.try_recv(),
            Ok(ServerEvent::ChatResolved { .. })
        ));
        assert!(outsider_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn targeted_notification_reaches_only_target() {
        let fx = Fixture::new();
        let (target, mut target_rx) = fx.connect(Role::User).await;
        let (_other, mut other_rx) = fx.connect(Role::User).await;

        fx.dispatcher
            .dispatch(DispatchEvent::Notification {
                notification: Notification::targeted(
                    target.identity,
                    "prize".to_string(),
                    "you won".to_string(),
                ),
            })
            .await;

        assert!(matches!(
            target_rx.try_recv(),
            Ok(ServerEvent::Notification { .. })
        ));
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_notification_reaches_all_users() {
        let fx = Fixture::new();
        let (_u1, mut rx1) = fx.connect(Role::User).await;
        let (_u2, mut rx2) = fx.connect(Role::User).await;
        let (_admin, mut admin_rx) = fx.connect(Role::Admin).await;

        fx.dispatcher
            .dispatch(DispatchEvent::Notification {
                notification: Notification::broadcast(
                    "maintenance".to_string(),
                    "tonight".to_string(),
                ),
            })
            .await;

        assert!(matches!(rx1.try_recv(), Ok(ServerEvent::Notification { .. })));
        assert!(matches!(rx2.try_recv(), Ok(ServerEvent::Notification { .. })));
        assert!(admin_rx.try_recv().is_err());
    }
}
