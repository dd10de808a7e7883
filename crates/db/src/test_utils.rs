//! Test utilities for database operations.
//!
//! Provides throwaway databases with the schema applied, plus fixtures for
//! the rows this service only reads (events and their rosters).

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{AttendeeStatus, Event, EventAttendee, event, event_attendee};
use crate::migrations::Migrator;

/// Test database configuration for running against `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "mixer_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "mixer_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "mixer_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// In-memory `SQLite` database with all migrations applied.
    ///
    /// The pool holds a single connection: every pooled connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn sqlite_memory() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// `PostgreSQL` database described by [`TestDbConfig`], migrated.
    pub async fn postgres(config: &TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Insert an event run by `coach_id`.
    pub async fn insert_event(&self, event_id: &str, coach_id: &str) -> Result<(), DbErr> {
        let model = event::ActiveModel {
            id: Set(event_id.to_string()),
            title: Set(format!("Mixer {event_id}")),
            coach_id: Set(coach_id.to_string()),
            scheduled_at: Set(None),
            created_at: Set(Utc::now()),
        };
        Event::insert(model).exec_without_returning(self.conn.as_ref()).await?;
        Ok(())
    }

    /// Register attendees in the given order, spacing registration times one
    /// second apart so roster order is deterministic.
    pub async fn insert_attendees(
        &self,
        event_id: &str,
        attendees: &[(&str, AttendeeStatus)],
    ) -> Result<(), DbErr> {
        let base = Utc::now() - Duration::hours(1);
        for (i, (user_id, status)) in attendees.iter().enumerate() {
            let model = event_attendee::ActiveModel {
                id: Set(format!("{event_id}_{user_id}")),
                event_id: Set(event_id.to_string()),
                user_id: Set((*user_id).to_string()),
                display_name: Set(display_name_for(user_id)),
                status: Set(*status),
                registered_at: Set(base + Duration::seconds(i64::try_from(i).unwrap_or(0))),
            };
            EventAttendee::insert(model)
                .exec_without_returning(self.conn.as_ref())
                .await?;
        }
        Ok(())
    }

    /// Insert an event together with confirmed attendees.
    pub async fn insert_event_with_roster(
        &self,
        event_id: &str,
        coach_id: &str,
        attendees: &[&str],
    ) -> Result<(), DbErr> {
        self.insert_event(event_id, coach_id).await?;
        let roster: Vec<(&str, AttendeeStatus)> = attendees
            .iter()
            .map(|user_id| (*user_id, AttendeeStatus::Confirmed))
            .collect();
        self.insert_attendees(event_id, &roster).await
    }
}

/// Display name given to fixture attendees.
#[must_use]
pub fn display_name_for(user_id: &str) -> String {
    format!("Guest {user_id}")
}
