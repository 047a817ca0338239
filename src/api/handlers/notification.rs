//! Notification handlers: create, list, read-toggle, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, patch, post};
use axum::{Json, Router};

use crate::api::dto::{CreateNotificationRequest, NotificationDto};
use crate::app_state::AppState;
use crate::auth::AccessClaims;
use crate::domain::{IdentityId, NotificationId, Role};
use crate::error::{ErrorResponse, GatewayError};

fn require_admin(role: Role) -> Result<(), GatewayError> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(GatewayError::Forbidden(
            "only admins can manage notifications".to_string(),
        ))
    }
}

/// `POST /notifications` — Broadcast a notification to all users.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers and
/// [`GatewayError::Validation`] for missing fields.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "Broadcast a notification",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = NotificationDto),
        (status = 400, description = "Missing title or description", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn create_broadcast(
    State(state): State<AppState>,
    claims: AccessClaims,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    require_admin(claims.role)?;
    let notification = state
        .notification_service
        .broadcast(&req.title, &req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(NotificationDto::from(&notification))))
}

/// `POST /notifications/user/:user_id` — Notify a single user.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers and
/// [`GatewayError::Validation`] for missing fields.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/user/{user_id}",
    tag = "Notifications",
    summary = "Notify a user",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Target user UUID"),
    ),
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = NotificationDto),
        (status = 400, description = "Missing title or description", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn create_targeted(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(user_id): Path<uuid::Uuid>,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    require_admin(claims.role)?;
    let notification = state
        .notification_service
        .send_to_user(IdentityId::from_uuid(user_id), &req.title, &req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(NotificationDto::from(&notification))))
}

/// `GET /notifications` — All notifications, newest first (admin view).
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "List all notifications",
    responses(
        (status = 200, description = "All notifications", body = Vec<NotificationDto>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn list_all(
    State(state): State<AppState>,
    claims: AccessClaims,
) -> Result<impl IntoResponse, GatewayError> {
    require_admin(claims.role)?;
    let notifications = state.notification_service.all().await?;
    Ok(Json(
        notifications
            .iter()
            .map(NotificationDto::from)
            .collect::<Vec<_>>(),
    ))
}

/// `GET /notifications/user/:user_id` — Notifications visible to a user.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] unless the caller is the user
/// themselves or an admin.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/user/{user_id}",
    tag = "Notifications",
    summary = "Notifications for a user",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Targeted and broadcast notifications", body = Vec<NotificationDto>),
        (status = 403, description = "Not the user or an admin", body = ErrorResponse),
    )
)]
pub async fn list_for_user(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(user_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let user = IdentityId::from_uuid(user_id);
    if !claims.role.is_admin() && claims.sub != user {
        return Err(GatewayError::Forbidden(
            "you can only read your own notifications".to_string(),
        ));
    }
    let notifications = state.notification_service.for_user(user).await?;
    Ok(Json(
        notifications
            .iter()
            .map(NotificationDto::from)
            .collect::<Vec<_>>(),
    ))
}

/// `PATCH /notifications/:id/read` — Toggle the read flag.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] for an unknown notification.
#[utoipa::path(
    patch,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    summary = "Toggle read state",
    params(
        ("id" = uuid::Uuid, Path, description = "Notification UUID"),
    ),
    responses(
        (status = 200, description = "Updated notification", body = NotificationDto),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn toggle_read(
    State(state): State<AppState>,
    _claims: AccessClaims,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let notification = state
        .notification_service
        .toggle_read(NotificationId::from_uuid(id))
        .await?;
    Ok(Json(NotificationDto::from(&notification)))
}

/// `DELETE /notifications/:id` — Delete a notification (admin only).
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admin callers and
/// [`GatewayError::NotFound`] for an unknown notification.
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    tag = "Notifications",
    summary = "Delete a notification",
    params(
        ("id" = uuid::Uuid, Path, description = "Notification UUID"),
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    require_admin(claims.role)?;
    state
        .notification_service
        .delete(NotificationId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(create_broadcast).get(list_all))
        .route(
            "/notifications/user/{user_id}",
            post(create_targeted).get(list_for_user),
        )
        .route("/notifications/{id}/read", patch(toggle_read))
        .route("/notifications/{id}", delete(delete_notification))
}
