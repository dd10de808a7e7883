//! Event capability checks.
//!
//! Registration and event management live outside this service. The session
//! controller only needs a handful of pre-resolved answers about the caller,
//! which this trait provides.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mixer_common::AppResult;
use mixer_db::repositories::EventRepository;

/// A confirmed attendee eligible to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMember {
    pub user_id: String,
    pub display_name: String,
    pub registered_at: DateTime<Utc>,
}

/// Capability checks the session controller relies on.
#[async_trait]
pub trait EventAccess: Send + Sync {
    /// Whether the event exists.
    async fn event_exists(&self, event_id: &str) -> AppResult<bool>;

    /// Whether the user's registration permits voting, rating and presenting.
    async fn is_confirmed_attendee(&self, event_id: &str, user_id: &str) -> AppResult<bool>;

    /// Whether the user runs the live session.
    async fn is_coach(&self, event_id: &str, user_id: &str) -> AppResult<bool>;

    /// Confirmed attendees in registration order.
    async fn confirmed_roster(&self, event_id: &str) -> AppResult<Vec<RosterMember>>;

    /// Name shown for an attendee, if registered.
    async fn display_name(&self, event_id: &str, user_id: &str) -> AppResult<Option<String>>;
}

/// Shared handle to an [`EventAccess`] implementation.
pub type SharedEventAccess = Arc<dyn EventAccess>;

/// [`EventAccess`] backed by the event and attendee tables.
#[derive(Clone)]
pub struct DbEventAccess {
    event_repo: EventRepository,
}

impl DbEventAccess {
    #[must_use]
    pub const fn new(event_repo: EventRepository) -> Self {
        Self { event_repo }
    }
}

#[async_trait]
impl EventAccess for DbEventAccess {
    async fn event_exists(&self, event_id: &str) -> AppResult<bool> {
        Ok(self.event_repo.find_by_id(event_id).await?.is_some())
    }

    async fn is_confirmed_attendee(&self, event_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self
            .event_repo
            .find_attendee(event_id, user_id)
            .await?
            .is_some_and(|a| a.status.is_confirmed()))
    }

    async fn is_coach(&self, event_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self
            .event_repo
            .find_by_id(event_id)
            .await?
            .is_some_and(|e| e.coach_id == user_id))
    }

    async fn confirmed_roster(&self, event_id: &str) -> AppResult<Vec<RosterMember>> {
        let roster = self.event_repo.confirmed_roster(event_id).await?;
        Ok(roster
            .into_iter()
            .map(|a| RosterMember {
                user_id: a.user_id,
                display_name: a.display_name,
                registered_at: a.registered_at,
            })
            .collect())
    }

    async fn display_name(&self, event_id: &str, user_id: &str) -> AppResult<Option<String>> {
        Ok(self
            .event_repo
            .find_attendee(event_id, user_id)
            .await?
            .map(|a| a.display_name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mixer_db::entities::{AttendeeStatus, event, event_attendee};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn attendee(status: AttendeeStatus) -> event_attendee::Model {
        event_attendee::Model {
            id: "a1".to_string(),
            event_id: "ev1".to_string(),
            user_id: "u1".to_string(),
            display_name: "Alex".to_string(),
            status,
            registered_at: Utc::now(),
        }
    }

    fn access(db: sea_orm::DatabaseConnection) -> DbEventAccess {
        DbEventAccess::new(EventRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_pending_attendee_is_not_confirmed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[attendee(AttendeeStatus::Pending)]])
            .into_connection();

        assert!(!access(db).is_confirmed_attendee("ev1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_confirmed_attendee() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[attendee(AttendeeStatus::Confirmed)]])
            .into_connection();

        assert!(access(db).is_confirmed_attendee("ev1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_coach_compares_coach_id() {
        let event = event::Model {
            id: "ev1".to_string(),
            title: "Friday mixer".to_string(),
            coach_id: "coach".to_string(),
            scheduled_at: None,
            created_at: Utc::now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[event.clone()], [event]])
            .into_connection();
        let access = access(db);

        assert!(access.is_coach("ev1", "coach").await.unwrap());
        assert!(!access.is_coach("ev1", "u1").await.unwrap());
    }
}
