//! Auth token service: access and refresh JWTs.
//!
//! Access tokens carry identity id, email, and role; refresh tokens are a
//! separate longer-lived claim carrying only the identity id, signed with
//! its own secret. Socket handshakes and REST requests both authenticate
//! through [`TokenService`].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::domain::{IdentityId, Role};
use crate::error::GatewayError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Identity id (subject).
    pub sub: IdentityId,
    /// Account email.
    pub email: String,
    /// Role of the identity.
    pub role: Role,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Claims carried by a refresh token: the identity id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Identity id (subject).
    pub sub: IdentityId,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// A freshly minted access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

/// Issues and verifies access and refresh tokens (HS256).
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service from the gateway configuration.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self::with_secrets(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        )
    }

    /// Creates a token service from raw secrets and lifetimes.
    #[must_use]
    pub fn with_secrets(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    /// Issues an access/refresh pair for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if token encoding fails.
    pub fn issue_pair(
        &self,
        identity: IdentityId,
        email: &str,
        role: Role,
    ) -> Result<TokenPair, GatewayError> {
        let now = Utc::now();
        let access = AccessClaims {
            sub: identity,
            email: email.to_string(),
            role,
            exp: (now + self.access_ttl).timestamp(),
            iat: now.timestamp(),
        };
        let refresh = RefreshClaims {
            sub: identity,
            exp: (now + self.refresh_ttl).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(&Header::default(), &access, &self.access_encoding)
            .map_err(|e| GatewayError::Internal(format!("failed to sign access token: {e}")))?;
        let refresh_token = encode(&Header::default(), &refresh, &self.refresh_encoding)
            .map_err(|e| GatewayError::Internal(format!("failed to sign refresh token: {e}")))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verifies an access token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] for missing, expired, or otherwise
    /// invalid tokens.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, GatewayError> {
        decode_claims(token, &self.access_decoding, "access token", true)
    }

    /// Verifies a refresh token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] for missing, expired, or otherwise
    /// invalid tokens.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, GatewayError> {
        decode_claims(token, &self.refresh_decoding, "refresh token", true)
    }

    /// Mints a fresh pair from a valid refresh token.
    ///
    /// The refresh claim carries only the identity id; email and role are
    /// recovered from the presented access token, whose signature must
    /// still verify but whose expiry is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] if either token fails verification
    /// or the two tokens belong to different identities.
    pub fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, GatewayError> {
        let refresh = self.verify_refresh(refresh_token)?;
        let access: AccessClaims =
            decode_claims(access_token, &self.access_decoding, "access token", false)?;

        if access.sub != refresh.sub {
            return Err(GatewayError::Auth(
                "refresh token does not match the presented identity".to_string(),
            ));
        }

        self.issue_pair(refresh.sub, &access.email, access.role)
    }
}

/// Decodes and validates a claim set, mapping jsonwebtoken errors onto the
/// gateway taxonomy. `validate_exp = false` accepts expired (but correctly
/// signed) tokens for the refresh flow.
fn decode_claims<T: serde::de::DeserializeOwned>(
    token: &str,
    key: &DecodingKey,
    kind: &str,
    validate_exp: bool,
) -> Result<T, GatewayError> {
    if token.is_empty() {
        return Err(GatewayError::Auth(format!("{kind} is required")));
    }

    let mut validation = Validation::default();
    validation.validate_exp = validate_exp;

    decode::<T>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                GatewayError::Auth(format!("{kind} has expired"))
            }
            _ => GatewayError::Auth(format!("invalid {kind}")),
        })
}

/// Extracts the bearer token from an `Authorization` header value.
#[must_use]
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

impl FromRequestParts<AppState> for AccessClaims {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| GatewayError::Auth("missing Authorization header".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| GatewayError::Auth("malformed Authorization header".to_string()))?;

        state.tokens.verify_access(token)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::with_secrets("access-secret", "refresh-secret", 3600, 86_400)
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let tokens = service();
        let identity = IdentityId::new();
        let Ok(pair) = tokens.issue_pair(identity, "user@example.com", Role::User) else {
            panic!("issuing failed");
        };

        let Ok(claims) = tokens.verify_access(&pair.access_token) else {
            panic!("verification failed");
        };
        assert_eq!(claims.sub, identity);
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.role, Role::User);

        let Ok(refresh) = tokens.verify_refresh(&pair.refresh_token) else {
            panic!("refresh verification failed");
        };
        assert_eq!(refresh.sub, identity);
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let tokens = service();
        let Ok(pair) = tokens.issue_pair(IdentityId::new(), "a@b.c", Role::Admin) else {
            panic!("issuing failed");
        };

        assert!(tokens.verify_access(&pair.refresh_token).is_err());
        assert!(tokens.verify_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn garbage_and_empty_tokens_are_rejected() {
        let tokens = service();
        assert!(matches!(
            tokens.verify_access("not-a-jwt"),
            Err(GatewayError::Auth(_))
        ));
        assert!(matches!(
            tokens.verify_access(""),
            Err(GatewayError::Auth(_))
        ));
    }

    #[test]
    fn expired_access_token_is_rejected() {
        // Well past the default decoding leeway.
        let tokens = TokenService::with_secrets("access-secret", "refresh-secret", -3600, 86_400);
        let Ok(pair) = tokens.issue_pair(IdentityId::new(), "a@b.c", Role::User) else {
            panic!("issuing failed");
        };

        let err = tokens.verify_access(&pair.access_token);
        let Err(GatewayError::Auth(message)) = err else {
            panic!("expected auth error");
        };
        assert!(message.contains("expired"));
    }

    #[test]
    fn refresh_mints_a_usable_pair() {
        let expired_access =
            TokenService::with_secrets("access-secret", "refresh-secret", -3600, 86_400);
        let identity = IdentityId::new();
        let Ok(pair) = expired_access.issue_pair(identity, "a@b.c", Role::Admin) else {
            panic!("issuing failed");
        };

        // Same secrets, sane TTLs: the refresh path accepts the expired
        // access token because only its signature is checked.
        let tokens = service();
        let Ok(fresh) = tokens.refresh(&pair.access_token, &pair.refresh_token) else {
            panic!("refresh failed");
        };

        let Ok(claims) = tokens.verify_access(&fresh.access_token) else {
            panic!("fresh access token invalid");
        };
        assert_eq!(claims.sub, identity);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn refresh_rejects_mismatched_identities() {
        let tokens = service();
        let Ok(pair_a) = tokens.issue_pair(IdentityId::new(), "a@b.c", Role::User) else {
            panic!("issuing failed");
        };
        let Ok(pair_b) = tokens.issue_pair(IdentityId::new(), "x@y.z", Role::User) else {
            panic!("issuing failed");
        };

        let result = tokens.refresh(&pair_a.access_token, &pair_b.refresh_token);
        assert!(matches!(result, Err(GatewayError::Auth(_))));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer xyz"), Some("xyz"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }
}
