//! # support-gateway
//!
//! Real-time support chat and notification gateway for a multi-tenant
//! promotions platform. Admins manage brands, campaigns and prizes in the
//! surrounding CRUD services; this crate owns the hard part — the live
//! socket core that connects users to admins.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handshake + Loop (ws/)
//!     │
//!     ├── ChatService / ConversationService / NotificationService (service/)
//!     ├── Dispatcher ── ConnectionRegistry + RoomManager (realtime/)
//!     │
//!     ├── MessageGateway (store/gateway)
//!     └── Store seam ── MemoryStore | PostgresStore (store/)
//! ```
//!
//! Auth (`auth/`) verifies the signed token presented at the socket
//! handshake and on every REST call; identity is always derived from the
//! verified claims, never from the payload.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod realtime;
pub mod service;
pub mod store;
pub mod ws;
