//! API endpoints.

mod activities;
mod coach;
mod health;
mod presentations;
mod voting;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    let attendee = Router::new()
        .merge(activities::router())
        .merge(voting::router())
        .merge(presentations::router());

    Router::new()
        .merge(health::router())
        .nest("/events/{event_id}", attendee)
        .nest("/coach/events/{event_id}", coach::router())
}
