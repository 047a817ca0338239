//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Socket handlers reuse the same enum and translate it into an `error`
//! frame instead of an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "chat not found: 7b6e...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                  |
/// |-----------|-------------------|------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request              |
/// | 2000–2999 | Not Found         | 404 Not Found                |
/// | 2500–2999 | Conflict          | 409 Conflict                 |
/// | 4000–4099 | Authentication    | 401 Unauthorized             |
/// | 4100–4199 | Authorization     | 403 Forbidden                |
/// | 3000–3999 | Server            | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed (missing or malformed required fields).
    #[error("invalid request: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// The operation conflicts with current state (duplicate open chat,
    /// competing claim).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The chat session is resolved and accepts no further messages.
    #[error("chat {0} is resolved; the session is closed")]
    ChatClosed(uuid::Uuid),

    /// Missing, expired, or invalid token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Authenticated identity is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::NotFound(_, _) => 2001,
            Self::Conflict(_) => 2501,
            Self::ChatClosed(_) => 2502,
            Self::Auth(_) => 4001,
            Self::Forbidden(_) => 4101,
            Self::Persistence(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_, _) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::ChatClosed(_) => StatusCode::CONFLICT,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the caller can recover by changing the request
    /// (4xx family), `false` for server-side failures.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Persistence(_) | Self::Internal(_))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if !self.is_client_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            GatewayError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::NotFound("chat", "x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Conflict("x".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::ChatClosed(uuid::Uuid::new_v4()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::Auth("x".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::Forbidden("x".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::Persistence("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_errors_are_recoverable() {
        assert!(GatewayError::Validation("x".to_string()).is_client_error());
        assert!(GatewayError::Conflict("x".to_string()).is_client_error());
        assert!(!GatewayError::Internal("x".to_string()).is_client_error());
        assert!(!GatewayError::Persistence("x".to_string()).is_client_error());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(GatewayError::Validation("x".to_string()).error_code(), 1001);
        assert_eq!(GatewayError::ChatClosed(uuid::Uuid::new_v4()).error_code(), 2502);
        assert_eq!(GatewayError::Auth("x".to_string()).error_code(), 4001);
    }
}
