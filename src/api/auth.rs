//! Caller identity extraction
//!
//! Session issuance happens upstream; by the time a request reaches the
//! engine its authenticated user id travels in the `x-user-id` header. A
//! missing or malformed header is `Unauthenticated`, fatal to the request.

use super::ApiError;
use crate::error::EngineError;
use crate::types::UserId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Header carrying the authenticated caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(EngineError::Unauthenticated)?;

        let id = Uuid::parse_str(value).map_err(|_| EngineError::Unauthenticated)?;
        Ok(Identity(UserId(id)))
    }
}
