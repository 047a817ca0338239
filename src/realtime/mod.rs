//! Real-time core: connection registry, room membership, and the
//! notification dispatcher.
//!
//! All state here is process-local and in-memory; a restart drops every
//! live connection and room membership, and clients re-handshake.

pub mod dispatcher;
pub mod registry;
pub mod rooms;

pub use dispatcher::Dispatcher;
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use rooms::RoomManager;
