//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user's id in the `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_parts(parts)
    }
}

fn caller_from_parts(parts: &Parts) -> Result<CallerId, AppError> {
    let value = parts
        .headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?;

    let raw = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header encoding".to_string()))?;

    raw.trim()
        .parse::<Uuid>()
        .map(CallerId)
        .map_err(|_| AppError::Unauthorized(format!("Invalid X-User-Id: '{raw}'")))
}
