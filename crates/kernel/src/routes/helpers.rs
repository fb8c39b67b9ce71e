//! Shared route helpers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::config::parse_flag;
use crate::error::AppError;
use crate::models::Viewer;

/// Comma-separated role names of the requesting user.
pub const ROLES_HEADER: &str = "x-user-roles";

/// `true`/`1` when the requesting user is a superuser.
pub const SUPERUSER_HEADER: &str = "x-user-superuser";

/// Read the viewer from identity headers set by an upstream auth layer.
///
/// Missing or unreadable headers give an anonymous viewer.
pub fn viewer_from_headers(headers: &HeaderMap) -> Viewer {
    let roles = headers
        .get(ROLES_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let is_superuser = headers
        .get(SUPERUSER_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(parse_flag);

    Viewer {
        roles,
        is_superuser,
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(viewer_from_headers(&parts.headers))
    }
}

/// Require a superuser for admin endpoints.
pub fn require_superuser(viewer: &Viewer) -> Result<(), AppError> {
    if viewer.is_superuser {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
