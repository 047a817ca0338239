//! Token refresh endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// Request body for the refresh endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// The (possibly expired) access token; its signature must verify.
    pub access_token: String,
    /// The long-lived refresh token.
    pub refresh_token: String,
}

/// Response carrying a fresh token pair.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// New refresh token.
    pub refresh_token: String,
}

/// `POST /auth/refresh` — Mint a fresh access/refresh pair.
///
/// # Errors
///
/// Returns [`GatewayError::Auth`] if either token fails verification or
/// the two tokens belong to different identities.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Auth",
    summary = "Refresh tokens",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fresh token pair", body = RefreshResponse),
        (status = 401, description = "Invalid or mismatched tokens", body = ErrorResponse),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let pair = state.tokens.refresh(&req.access_token, &req.refresh_token)?;
    Ok(Json(RefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Auth routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/refresh", post(refresh))
}
