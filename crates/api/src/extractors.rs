//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use mixer_common::AppError;

/// Identity forwarded by the gateway, stored in request extensions by
/// [`identity_middleware`](crate::middleware::identity_middleware).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
