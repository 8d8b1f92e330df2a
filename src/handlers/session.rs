use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderName, HeaderValue},
    response::Response,
};
use std::convert::Infallible;
use uuid::Uuid;

use crate::errors::ServiceError;

pub const SESSION_ID_HEADER: HeaderName = HeaderName::from_static("x-session-id");
pub const CUSTOMER_ID_HEADER: HeaderName = HeaderName::from_static("x-customer-id");

/// Cart session identity. Reads `X-Session-Id`; when the caller has no id
/// yet one is minted, and handlers echo it back so the client can persist
/// it for subsequent calls.
#[derive(Debug, Clone)]
pub struct CartSession {
    pub id: String,
    pub minted: bool,
}

impl CartSession {
    /// Stamp the session id onto an outgoing response.
    pub fn apply_to(&self, response: &mut Response) {
        if let Ok(value) = HeaderValue::from_str(&self.id) {
            response.headers_mut().insert(SESSION_ID_HEADER, value);
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(&SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(match provided {
            Some(id) => Self { id, minted: false },
            None => Self {
                id: Uuid::new_v4().to_string(),
                minted: true,
            },
        })
    }
}

/// Customer identity asserted by the upstream auth layer via
/// `X-Customer-Id`. Required for order history and downloads.
#[derive(Debug, Clone, Copy)]
pub struct CustomerId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CustomerId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(&CUSTOMER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ServiceError::Unauthorized("Customer identity required".to_string())
            })?;

        let id = Uuid::parse_str(raw)
            .map_err(|_| ServiceError::Unauthorized("Invalid customer id".to_string()))?;

        Ok(Self(id))
    }
}

/// Optional customer identity for endpoints that accept guests. A missing
/// or malformed header degrades to guest rather than failing the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaybeCustomerId(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeCustomerId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(&CUSTOMER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());

        Ok(Self(id))
    }
}
