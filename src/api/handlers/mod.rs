//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod chat;
pub mod message;
pub mod notification;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(chat::routes())
        .merge(message::routes())
        .merge(notification::routes())
        .merge(auth::routes())
}
