//! Request extractors.
//!
//! Wrappers over the axum extractors whose rejections render as
//! [`ApiError`] instead of plain text.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

use crate::error::ApiError;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// JSON body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Optional `Idempotency-Key` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdempotencyKey(pub Option<String>);

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IDEMPOTENCY_KEY_HEADER) else {
            return Ok(Self(None));
        };

        let key = value
            .to_str()
            .map_err(|_| ApiError::bad_request("INVALID_HEADER", "Idempotency-Key must be visible ASCII"))?
            .trim();

        if key.is_empty() {
            return Ok(Self(None));
        }
        if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(ApiError::bad_request(
                "INVALID_HEADER",
                format!("Idempotency-Key must be at most {MAX_IDEMPOTENCY_KEY_LEN} characters"),
            ));
        }

        Ok(Self(Some(key.to_string())))
    }
}
