//! # Authentication Middleware
//!
//! Bearer token middleware that resolves every request to a
//! [`Principal`]. Authorization itself happens in the engine.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{address}:{secret}
//! ```
//!
//! `role` is one of `holder`, `issuer`, `verifier`, `governor`. `address`
//! may be empty for verifiers. The secret is compared in constant time.
//!
//! When no token is configured (development only), the secret is not
//! checked: a well-formed header still selects the role, and a request
//! without one acts as an anonymous verifier.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use credpass_core::Address;
use credpass_engine::{Principal, Role};

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Authenticated principal, extracted by handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Principal);

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no principal in request context".into()))
    }
}

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of bearer secrets.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse `{role}:{address}:{secret}` into a principal.
///
/// With `expected_secret = None` the secret segment is not checked.
pub fn parse_bearer_token(
    provided: &str,
    expected_secret: Option<&str>,
) -> Result<Principal, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();
    let [role_str, address_str, secret] = parts.as_slice() else {
        return Err("invalid token format: expected {role}:{address}:{secret}".into());
    };

    if let Some(expected) = expected_secret {
        if !constant_time_token_eq(secret, expected) {
            return Err("invalid bearer token".into());
        }
    }

    let role: Role = role_str.parse().map_err(|e| format!("{e}"))?;
    let address = if address_str.is_empty() {
        None
    } else {
        Some(
            address_str
                .parse::<Address>()
                .map_err(|e| format!("invalid address: {e}"))?,
        )
    };

    Principal::new(role, address).map_err(|e| e.to_string())
}

/// Resolve the Authorization header to a [`Caller`] and inject it into
/// request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();
    let expected = config.token.as_ref().map(|t| t.as_str());

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = match (auth_header, expected) {
        (Some(value), _) if value.starts_with("Bearer ") => {
            match parse_bearer_token(&value[7..], expected) {
                Ok(principal) => principal,
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                    return unauthorized_response(&msg);
                }
            }
        }
        (Some(_), Some(_)) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            return unauthorized_response("authorization header must use Bearer scheme");
        }
        (None, Some(_)) => {
            tracing::warn!("authentication failed: missing authorization header");
            return unauthorized_response("missing authorization header");
        }
        (_, None) => Principal::verifier(),
    };

    request.extensions_mut().insert(Caller(principal));
    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
