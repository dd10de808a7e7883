//! Event and attendee repository.

use std::sync::Arc;

use crate::entities::{AttendeeStatus, Event, EventAttendee, event, event_attendee};
use mixer_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Read access to events and their registration roster.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))
    }

    /// Create an event.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's registration for an event.
    pub async fn find_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<event_attendee::Model>> {
        EventAttendee::find()
            .filter(event_attendee::Column::EventId.eq(event_id))
            .filter(event_attendee::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Confirmed attendees in registration order.
    pub async fn confirmed_roster(&self, event_id: &str) -> AppResult<Vec<event_attendee::Model>> {
        EventAttendee::find()
            .filter(event_attendee::Column::EventId.eq(event_id))
            .filter(event_attendee::Column::Status.eq(AttendeeStatus::Confirmed))
            .order_by_asc(event_attendee::Column::RegisteredAt)
            .order_by_asc(event_attendee::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Register an attendee.
    pub async fn create_attendee(
        &self,
        model: event_attendee::ActiveModel,
    ) -> AppResult<event_attendee::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn attendee(id: &str, user_id: &str) -> event_attendee::Model {
        event_attendee::Model {
            id: id.to_string(),
            event_id: "ev1".to_string(),
            user_id: user_id.to_string(),
            display_name: format!("User {user_id}"),
            status: AttendeeStatus::Confirmed,
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_event_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<event::Model>::new()])
                .into_connection(),
        );
        let repo = EventRepository::new(db);

        let err = repo.get_by_id("nope").await.unwrap_err();
        assert!(matches!(err, AppError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn test_confirmed_roster_returns_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[attendee("a1", "u1"), attendee("a2", "u2")]])
                .into_connection(),
        );
        let repo = EventRepository::new(db);

        let roster = repo.confirmed_roster("ev1").await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].user_id, "u1");
    }
}
