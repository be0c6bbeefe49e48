//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use facility_admin_common::AppError;

/// Header carrying the authenticated administrator's ID. Authentication
/// happens upstream; requests without it are rejected.
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// Authenticated administrator extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub String);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ADMIN_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Self(id.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}
