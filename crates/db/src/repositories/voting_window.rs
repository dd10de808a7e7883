//! Voting window repository.

use std::sync::Arc;

use crate::entities::{VotingWindow, voting_window};
use mixer_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
    sea_query::Expr,
};

/// Voting window repository for database operations.
#[derive(Clone)]
pub struct VotingWindowRepository {
    db: Arc<DatabaseConnection>,
}

impl VotingWindowRepository {
    /// Create a new voting window repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The pooled connection, for callers outside a transaction.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Start a transaction on the underlying connection.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the window of an event.
    pub async fn find(&self, event_id: &str) -> AppResult<Option<voting_window::Model>> {
        VotingWindow::find_by_id(event_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the window and lock its row for the rest of the transaction.
    pub async fn find_for_update<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
    ) -> AppResult<Option<voting_window::Model>> {
        VotingWindow::find_by_id(event_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a window.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: voting_window::ActiveModel,
    ) -> AppResult<voting_window::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a window.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: voting_window::ActiveModel,
    ) -> AppResult<voting_window::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count one more voter with both categories cast.
    pub async fn increment_complete_voters<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
    ) -> AppResult<()> {
        VotingWindow::update_many()
            .col_expr(
                voting_window::Column::TotalCompleteVoters,
                Expr::col(voting_window::Column::TotalCompleteVoters).add(1),
            )
            .filter(voting_window::Column::EventId.eq(event_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
