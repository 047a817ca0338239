//! Axum WebSocket upgrade handler.
//!
//! Authentication precedes registration: the handshake must carry a valid
//! access token in the query string, and a failed verification rejects the
//! upgrade with 401 before any registry mutation.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::GatewayError;

/// Query parameters of the socket handshake.
#[derive(Debug, Deserialize)]
pub struct HandshakeParams {
    /// Bearer access token.
    token: Option<String>,
}

/// `GET /ws?token=<jwt>` — Authenticated WebSocket upgrade.
///
/// # Errors
///
/// Returns [`GatewayError::Auth`] for a missing or invalid token; the
/// connection is never admitted.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HandshakeParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let token = params
        .token
        .ok_or_else(|| GatewayError::Auth("handshake token is required".to_string()))?;
    let claims = state.tokens.verify_access(&token)?;

    Ok(ws.on_upgrade(move |socket| run_connection(socket, state, claims)))
}
