//! # Request Extraction Helpers
//!
//! JSON bodies are extracted as `Result<Json<T>, JsonRejection>` so that
//! malformed payloads surface as the structured [`AppError::BadRequest`]
//! rather than Axum's plain-text rejection. Path segments are taken as
//! strings and parsed here, so a bad id or address is a 422 with the
//! same error body as any other validation failure.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use credpass_core::{Address, CredentialId, ValidationError};

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a `:id` path segment.
pub fn parse_credential_id(raw: &str) -> Result<CredentialId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("invalid credential id: \"{raw}\"")))
}

/// Parse an `:address` path segment.
pub fn parse_address(raw: &str) -> Result<Address, AppError> {
    Address::parse(raw).map_err(|e: ValidationError| AppError::from(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_id_parses_decimal() {
        assert_eq!(parse_credential_id("42").unwrap(), CredentialId::new(42));
    }

    #[test]
    fn credential_id_rejects_garbage() {
        let err = parse_credential_id("abc").unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("abc")));
    }

    #[test]
    fn address_rejects_short_hex() {
        assert!(matches!(
            parse_address("0x1234").unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn address_accepts_lowercase() {
        let addr = parse_address("0x1111111111111111111111111111111111111111").unwrap();
        assert_eq!(addr, Address::from_bytes([0x11; 20]));
    }
}
