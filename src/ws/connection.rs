//! Per-connection event loop.
//!
//! Runs the read/write loop for one authenticated WebSocket connection:
//! registers it, forwards outbound events from the dispatcher, and handles
//! inbound client events inline — each frame's handler completes before
//! the next frame is read, which is what gives events from the same
//! connection their arrival-order guarantee.

use std::sync::Arc;

use axum::extract::ws::{Message as WsFrame, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{ClientEvent, ServerEvent};
use crate::app_state::AppState;
use crate::auth::AccessClaims;
use crate::domain::{ChatId, DispatchEvent, RoomId};
use crate::error::GatewayError;
use crate::realtime::ConnectionHandle;

/// Runs the read/write loop for a single authenticated connection.
pub async fn run_connection(socket: WebSocket, state: AppState, claims: AccessClaims) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.connection_buffer);

    let handle = Arc::new(ConnectionHandle::new(claims.sub, claims.role, tx));
    let connection_id = handle.id;

    if let Some(displaced) = state.registry.register(Arc::clone(&handle)).await {
        // The older device loses its rooms; its loop ends on client close.
        state.rooms.leave_all(displaced.id).await;
    }
    if claims.role.is_admin() {
        state.rooms.join(connection_id, RoomId::Admins).await;
    }

    tracing::info!(connection = %connection_id, identity = %claims.sub, role = %claims.role, "socket connected");

    loop {
        tokio::select! {
            // Incoming frame from the client.
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(WsFrame::Text(text))) => {
                        let reply = handle_frame(&state, &handle, &text).await;
                        if let Some(event) = reply {
                            handle.send(event);
                        }
                    }
                    Some(Ok(WsFrame::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            // Outbound event from the dispatcher.
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(err) => {
                                tracing::error!(connection = %connection_id, %err, "event serialization failed");
                                continue;
                            }
                        };
                        if ws_tx.send(WsFrame::text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // In-flight persistence triggered by this connection is not rolled
    // back; only the live state is torn down.
    state.registry.unregister(connection_id).await;
    state.rooms.leave_all(connection_id).await;
    tracing::info!(connection = %connection_id, identity = %claims.sub, "socket disconnected");
}

/// Parses and handles one inbound frame, returning an error event for the
/// sender when the operation fails.
async fn handle_frame(
    state: &AppState,
    handle: &Arc<ConnectionHandle>,
    text: &str,
) -> Option<ServerEvent> {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(_) => {
            return Some(ServerEvent::Error {
                code: 1001,
                message: "malformed event".to_string(),
            });
        }
    };

    match handle_event(state, handle, event).await {
        Ok(()) => None,
        Err(err) => Some(ServerEvent::Error {
            code: err.error_code(),
            message: err.to_string(),
        }),
    }
}

async fn handle_event(
    state: &AppState,
    handle: &Arc<ConnectionHandle>,
    event: ClientEvent,
) -> Result<(), GatewayError> {
    match event {
        ClientEvent::JoinConversation { conversation_id } => {
            state
                .rooms
                .join(handle.id, RoomId::Conversation(conversation_id))
                .await;
            Ok(())
        }

        ClientEvent::LeaveConversation { conversation_id } => {
            state
                .rooms
                .leave(handle.id, RoomId::Conversation(conversation_id))
                .await;
            Ok(())
        }

        ClientEvent::JoinChat { chat_id } => {
            // Access is checked before the room mutation; an admin joining
            // also claims the chat (pending → active).
            if handle.role.is_admin() {
                state.chat_service.claim(chat_id, handle.identity).await?;
            } else {
                let _ = state
                    .chat_service
                    .get(chat_id, handle.identity, handle.role)
                    .await?;
            }
            state.rooms.join(handle.id, RoomId::Chat(chat_id)).await;
            Ok(())
        }

        ClientEvent::LeaveChat { chat_id } => {
            state.rooms.leave(handle.id, RoomId::Chat(chat_id)).await;
            Ok(())
        }

        ClientEvent::SendMessage { chat_id, content } => {
            state
                .chat_service
                .send_message(chat_id, handle.identity, handle.role, &content)
                .await?;
            Ok(())
        }

        ClientEvent::AdminTyping { chat_id } => {
            if !handle.role.is_admin() {
                return Err(GatewayError::Forbidden(
                    "admin_typing requires the admin role".to_string(),
                ));
            }
            dispatch_typing(state, handle, chat_id).await;
            Ok(())
        }

        ClientEvent::UserTyping { chat_id } => {
            if handle.role.is_admin() {
                return Err(GatewayError::Forbidden(
                    "user_typing requires the user role".to_string(),
                ));
            }
            dispatch_typing(state, handle, chat_id).await;
            Ok(())
        }
    }
}

/// Typing is fire-and-forget: no persistence, no waiting on stores.
async fn dispatch_typing(state: &AppState, handle: &Arc<ConnectionHandle>, chat_id: ChatId) {
    state
        .dispatcher
        .dispatch(DispatchEvent::Typing {
            chat_id,
            sender_connection: handle.id,
            sender: handle.identity,
            role: handle.role,
        })
        .await;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::domain::{ChatStatus, IdentityId, Role};
    use crate::store::MemoryStore;
    use crate::ws::messages::ServerEvent;

    fn app_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::with_secrets("a", "r", 3600, 86_400);
        AppState::new(store, tokens, 16)
    }

    async fn connect(
        state: &AppState,
        role: Role,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(IdentityId::new(), role, tx));
        let _ = state.registry.register(Arc::clone(&handle)).await;
        if role.is_admin() {
            state.rooms.join(handle.id, RoomId::Admins).await;
        }
        (handle, rx)
    }

    #[tokio::test]
    async fn malformed_frame_yields_error_event() {
        let state = app_state();
        let (handle, _rx) = connect(&state, Role::User).await;

        let reply = handle_frame(&state, &handle, "{not json").await;
        let Some(ServerEvent::Error { code, .. }) = reply else {
            panic!("expected error event");
        };
        assert_eq!(code, 1001);
    }

    #[tokio::test]
    async fn admin_join_chat_claims_and_notifies_room() {
        let state = app_state();
        let (user, mut user_rx) = connect(&state, Role::User).await;
        let (admin, _admin_rx) = connect(&state, Role::Admin).await;

        let Ok(chat) = state.chat_service.create(user.identity, "billing").await else {
            panic!("create failed");
        };

        // The user joins the chat room first.
        let joined = handle_event(
            &state,
            &user,
            ClientEvent::JoinChat { chat_id: chat.id },
        )
        .await;
        assert!(joined.is_ok());

        let claimed = handle_event(
            &state,
            &admin,
            ClientEvent::JoinChat { chat_id: chat.id },
        )
        .await;
        assert!(claimed.is_ok());

        let Ok(Some(reloaded)) = state
            .chat_service
            .get(chat.id, admin.identity, Role::Admin)
            .await
            .map(|(c, _)| Some(c))
        else {
            panic!("chat gone");
        };
        assert_eq!(reloaded.status, ChatStatus::Active);
        assert_eq!(reloaded.admin, Some(admin.identity));

        let Ok(ServerEvent::AdminJoined { chat_id, admin_id }) = user_rx.try_recv() else {
            panic!("room member should receive admin_joined");
        };
        assert_eq!(chat_id, chat.id);
        assert_eq!(admin_id, admin.identity);
    }

    #[tokio::test]
    async fn stranger_cannot_join_someone_elses_chat() {
        let state = app_state();
        let (owner, _rx1) = connect(&state, Role::User).await;
        let (stranger, _rx2) = connect(&state, Role::User).await;

        let Ok(chat) = state.chat_service.create(owner.identity, "billing").await else {
            panic!("create failed");
        };

        let result = handle_event(
            &state,
            &stranger,
            ClientEvent::JoinChat { chat_id: chat.id },
        )
        .await;
        assert!(matches!(result, Err(GatewayError::Forbidden(_))));
        assert!(!state.rooms.is_member(stranger.id, RoomId::Chat(chat.id)).await);
    }

    #[tokio::test]
    async fn typing_events_are_role_checked() {
        let state = app_state();
        let (user, _rx) = connect(&state, Role::User).await;

        let wrong = handle_event(
            &state,
            &user,
            ClientEvent::AdminTyping {
                chat_id: ChatId::new(),
            },
        )
        .await;
        assert!(matches!(wrong, Err(GatewayError::Forbidden(_))));
    }

    #[tokio::test]
    async fn send_message_into_resolved_chat_reports_closed_session() {
        let state = app_state();
        let (user, _rx) = connect(&state, Role::User).await;

        let Ok(chat) = state.chat_service.create(user.identity, "billing").await else {
            panic!("create failed");
        };
        let Ok(_) = state
            .chat_service
            .resolve(chat.id, IdentityId::new(), Role::Admin)
            .await
        else {
            panic!("resolve failed");
        };

        let reply = handle_frame(
            &state,
            &user,
            &format!(r#"{{"event":"send_message","chat_id":"{}","content":"hi"}}"#, chat.id),
        )
        .await;
        let Some(ServerEvent::Error { code, .. }) = reply else {
            panic!("expected closed-session error");
        };
        assert_eq!(code, GatewayError::ChatClosed(*chat.id.as_uuid()).error_code());
    }
}
