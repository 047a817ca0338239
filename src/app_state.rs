//! Shared application state injected into all Axum handlers.
//!
//! Explicitly constructed at startup and threaded through axum's `State`
//! extractor; nothing here is a global singleton.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::realtime::{ConnectionRegistry, Dispatcher, RoomManager};
use crate::service::{ChatService, ConversationService, NotificationService};
use crate::store::{MessageGateway, Store};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Access/refresh token service.
    pub tokens: Arc<TokenService>,
    /// Live connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Room membership manager.
    pub rooms: Arc<RoomManager>,
    /// Real-time notification dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Chat session state machine.
    pub chat_service: Arc<ChatService>,
    /// Conversation channel service.
    pub conversation_service: Arc<ConversationService>,
    /// Notification service.
    pub notification_service: Arc<NotificationService>,
    /// Per-connection outbound event buffer capacity.
    pub connection_buffer: usize,
}

impl AppState {
    /// Wires the full service graph over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, connection_buffer: usize) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let rooms = Arc::new(RoomManager::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), Arc::clone(&rooms)));
        let gateway = MessageGateway::new(Arc::clone(&store));

        let chat_service = Arc::new(ChatService::new(
            Arc::clone(&store),
            gateway.clone(),
            Arc::clone(&dispatcher),
        ));
        let conversation_service = Arc::new(ConversationService::new(
            Arc::clone(&store),
            gateway,
            Arc::clone(&dispatcher),
        ));
        let notification_service = Arc::new(NotificationService::new(
            Arc::clone(&store),
            Arc::clone(&dispatcher),
        ));

        Self {
            tokens: Arc::new(tokens),
            registry,
            rooms,
            dispatcher,
            chat_service,
            conversation_service,
            notification_service,
            connection_buffer,
        }
    }
}
