//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::chat::create_chat,
        handlers::chat::chat_history,
        handlers::chat::get_chat,
        handlers::chat::resolve_chat,
        handlers::message::send_message,
        handlers::message::respond_to_conversation,
        handlers::message::user_messages,
        handlers::message::list_conversations,
        handlers::message::conversation_messages,
        handlers::notification::create_broadcast,
        handlers::notification::create_targeted,
        handlers::notification::list_all,
        handlers::notification::list_for_user,
        handlers::notification::toggle_read,
        handlers::notification::delete_notification,
        handlers::auth::refresh,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Chats", description = "Support chat sessions"),
        (name = "Messages", description = "Conversation channels"),
        (name = "Notifications", description = "Admin-created notifications"),
        (name = "Auth", description = "Token refresh"),
        (name = "System", description = "Health and diagnostics"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", <ApiDoc as OpenApi>::openapi()),
    );

    router
}
