//! HTTP API layer for mixer.
//!
//! - **Endpoints**: attendee voting, polling and rating; coach controls
//! - **Extractors**: identity forwarded by the gateway
//! - **Middleware**: identity propagation
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;

/// The API router with identity propagation applied and state attached.
pub fn app(state: AppState) -> Router {
    router()
        .layer(from_fn_with_state(
            state.clone(),
            middleware::identity_middleware,
        ))
        .with_state(state)
}
