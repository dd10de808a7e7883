//! API middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    middleware::Next,
    response::Response,
};
use mixer_common::{AppError, AppResult, config::AuthConfig};
use mixer_core::SessionController;

use crate::extractors::CurrentUser;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionController,
    pub user_header: Arc<HeaderName>,
}

impl AppState {
    /// Create the state, validating the configured identity header name.
    pub fn new(session: SessionController, auth: &AuthConfig) -> AppResult<Self> {
        let user_header = HeaderName::from_bytes(auth.user_header.as_bytes()).map_err(|e| {
            AppError::Config(format!("Invalid user header {:?}: {e}", auth.user_header))
        })?;
        Ok(Self {
            session,
            user_header: Arc::new(user_header),
        })
    }
}

/// Identity middleware.
///
/// Authentication happens upstream; a non-empty identity header becomes a
/// [`CurrentUser`] extension. Requests without one reach the handlers
/// unauthenticated and are rejected by [`AuthUser`](crate::extractors::AuthUser).
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = req
        .headers()
        .get(state.user_header.as_ref())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string);

    if let Some(id) = user_id {
        req.extensions_mut().insert(CurrentUser { id });
    }

    next.run(req).await
}
