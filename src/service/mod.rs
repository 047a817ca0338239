//! Service layer: orchestration over the store, gateway, and dispatcher.
//!
//! Every mutation follows the same pattern: validate → load → transition →
//! persist → dispatch → return. Services never write responses; handlers
//! translate the typed errors at the edge.

pub mod chat;
pub mod conversation;
pub mod notification;

pub use chat::ChatService;
pub use conversation::ConversationService;
pub use notification::NotificationService;
