//! Conversation channel handlers: send, respond, logs, dashboard list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ConversationDto, MessageDto, RespondRequest, SendMessageRequest};
use crate::app_state::AppState;
use crate::auth::AccessClaims;
use crate::domain::{ConversationId, IdentityId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /messages` — User sends into their own conversation.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for an empty message.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    summary = "Send a message",
    description = "Appends a message to the caller's conversation, creating it on first use, and notifies all connected admins.",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message persisted", body = MessageDto),
        (status = 400, description = "Empty message", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    claims: AccessClaims,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let message = state
        .conversation_service
        .send(claims.sub, &req.message)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

/// `POST /messages/respond` — Admin responds in a conversation.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers and
/// [`GatewayError::NotFound`] for an unknown conversation.
#[utoipa::path(
    post,
    path = "/api/v1/messages/respond",
    tag = "Messages",
    summary = "Respond to a conversation",
    request_body = RespondRequest,
    responses(
        (status = 201, description = "Response persisted", body = MessageDto),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn respond_to_conversation(
    State(state): State<AppState>,
    claims: AccessClaims,
    Json(req): Json<RespondRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let message = state
        .conversation_service
        .respond(
            claims.sub,
            claims.role,
            ConversationId::from_uuid(req.conversation_id),
            &req.message,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

/// `GET /messages/user/:user_id` — A user's conversation log.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] unless the caller is the user
/// themselves or an admin; [`GatewayError::NotFound`] if the user has no
/// conversation yet.
#[utoipa::path(
    get,
    path = "/api/v1/messages/user/{user_id}",
    tag = "Messages",
    summary = "Messages of a user's conversation",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Ordered message log", body = Vec<MessageDto>),
        (status = 403, description = "Not the user or an admin", body = ErrorResponse),
        (status = 404, description = "No conversation for this user", body = ErrorResponse),
    )
)]
pub async fn user_messages(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(user_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let user = IdentityId::from_uuid(user_id);
    if !claims.role.is_admin() && claims.sub != user {
        return Err(GatewayError::Forbidden(
            "you can only read your own conversation".to_string(),
        ));
    }
    let messages = state.conversation_service.messages_for_user(user).await?;
    Ok(Json(
        messages.iter().map(MessageDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /conversations` — All conversations, newest first (admin
/// dashboard).
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "Messages",
    summary = "List conversations",
    responses(
        (status = 200, description = "Conversations by recency", body = Vec<ConversationDto>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    claims: AccessClaims,
) -> Result<impl IntoResponse, GatewayError> {
    let conversations = state.conversation_service.list(claims.role).await?;
    Ok(Json(
        conversations
            .iter()
            .map(ConversationDto::from)
            .collect::<Vec<_>>(),
    ))
}

/// `GET /conversations/:id/messages` — Ordered log of a conversation
/// (admin dashboard).
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers and
/// [`GatewayError::NotFound`] for an unknown conversation.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/messages",
    tag = "Messages",
    summary = "Messages of a conversation",
    params(
        ("id" = uuid::Uuid, Path, description = "Conversation UUID"),
    ),
    responses(
        (status = 200, description = "Ordered message log", body = Vec<MessageDto>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn conversation_messages(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    if !claims.role.is_admin() {
        return Err(GatewayError::Forbidden(
            "only admins can read conversations by id".to_string(),
        ));
    }
    let messages = state
        .conversation_service
        .messages(ConversationId::from_uuid(id))
        .await?;
    Ok(Json(
        messages.iter().map(MessageDto::from).collect::<Vec<_>>(),
    ))
}

/// Conversation and message routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/respond", post(respond_to_conversation))
        .route("/messages/user/{user_id}", get(user_messages))
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}/messages", get(conversation_messages))
}
