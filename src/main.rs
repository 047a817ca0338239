//! support-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use support_gateway::api;
use support_gateway::app_state::AppState;
use support_gateway::auth::TokenService;
use support_gateway::config::GatewayConfig;
use support_gateway::store::{MemoryStore, PostgresStore, Store};
use support_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting support-gateway");

    // Select the store backend
    let store: Arc<dyn Store> = if config.persistence_enabled {
        tracing::info!("using PostgreSQL store");
        Arc::new(PostgresStore::connect(&config).await?)
    } else {
        tracing::warn!("using in-memory store; all state is lost on restart");
        Arc::new(MemoryStore::new())
    };

    // Build application state (token service + realtime core + services)
    let tokens = TokenService::new(&config);
    let app_state = AppState::new(store, tokens, config.connection_buffer);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
