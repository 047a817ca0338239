//! Chat session handlers: create, history, detail, resolve.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ChatDetailResponse, ChatDto, CreateChatRequest, HistoryResponse, MessageDto, PaginationParams,
};
use crate::app_state::AppState;
use crate::auth::AccessClaims;
use crate::domain::ChatId;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /chats` — Open a new chat session for the caller.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] if the caller already has an open
/// session, [`GatewayError::Validation`] for a missing category.
#[utoipa::path(
    post,
    path = "/api/v1/chats",
    tag = "Chats",
    summary = "Open a chat session",
    description = "Creates a pending chat for the authenticated identity and notifies all connected admins. A caller with an open session receives a conflict.",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat created", body = ChatDto),
        (status = 400, description = "Missing category", body = ErrorResponse),
        (status = 409, description = "Caller already has an open session", body = ErrorResponse),
    )
)]
pub async fn create_chat(
    State(state): State<AppState>,
    claims: AccessClaims,
    Json(req): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let chat = state.chat_service.create(claims.sub, &req.category).await?;
    Ok((StatusCode::CREATED, Json(ChatDto::from(&chat))))
}

/// `GET /chats` — Paginated history for the caller.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/chats",
    tag = "Chats",
    summary = "Chat and conversation history",
    description = "Returns the channels where the caller participates, sorted by most recent activity.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated history", body = HistoryResponse),
    )
)]
pub async fn chat_history(
    State(state): State<AppState>,
    claims: AccessClaims,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let params = params.clamped();
    let page = state
        .chat_service
        .history(claims.sub, params.page, params.per_page)
        .await?;
    Ok(Json(HistoryResponse::from_page(page, params.per_page)))
}

/// `GET /chats/:id` — Chat detail with its message log.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for an unknown chat and
/// [`GatewayError::Forbidden`] for a caller without access.
#[utoipa::path(
    get,
    path = "/api/v1/chats/{id}",
    tag = "Chats",
    summary = "Get a chat with its messages",
    params(
        ("id" = uuid::Uuid, Path, description = "Chat UUID"),
    ),
    responses(
        (status = 200, description = "Chat detail", body = ChatDetailResponse),
        (status = 403, description = "No access to this chat", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse),
    )
)]
pub async fn get_chat(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let (chat, messages) = state
        .chat_service
        .get(ChatId::from_uuid(id), claims.sub, claims.role)
        .await?;
    Ok(Json(ChatDetailResponse {
        chat: ChatDto::from(&chat),
        messages: messages.iter().map(MessageDto::from).collect(),
    }))
}

/// `POST /chats/:id/resolve` — Resolve a chat (admin only).
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers and
/// [`GatewayError::ChatClosed`] if the chat is already resolved.
#[utoipa::path(
    post,
    path = "/api/v1/chats/{id}/resolve",
    tag = "Chats",
    summary = "Resolve a chat",
    description = "Marks the chat resolved and notifies its room. Resolved chats accept no further messages.",
    params(
        ("id" = uuid::Uuid, Path, description = "Chat UUID"),
    ),
    responses(
        (status = 200, description = "Chat resolved", body = ChatDto),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse),
        (status = 409, description = "Chat already resolved", body = ErrorResponse),
    )
)]
pub async fn resolve_chat(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let chat = state
        .chat_service
        .resolve(ChatId::from_uuid(id), claims.sub, claims.role)
        .await?;
    Ok(Json(ChatDto::from(&chat)))
}

/// Chat session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chats", post(create_chat).get(chat_history))
        .route("/chats/{id}", get(get_chat))
        .route("/chats/{id}/resolve", post(resolve_chat))
}
