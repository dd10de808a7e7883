//! Presentation queue repository.

use std::sync::Arc;

use crate::entities::{
    PresentationEntry, PresentationQueue, PresentationState, presentation_entry,
    presentation_queue,
};
use mixer_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::Expr,
};

/// Repository for the per-event queue row and its entries.
#[derive(Clone)]
pub struct PresentationRepository {
    db: Arc<DatabaseConnection>,
}

impl PresentationRepository {
    /// Create a new presentation repository.
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

    // === Queue ===

    /// Find the queue of an event.
    pub async fn find_queue(&self, event_id: &str) -> AppResult<Option<presentation_queue::Model>> {
        PresentationQueue::find_by_id(event_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the queue and lock its row for the rest of the transaction.
    pub async fn find_queue_for_update<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
    ) -> AppResult<Option<presentation_queue::Model>> {
        PresentationQueue::find_by_id(event_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create the queue row.
    pub async fn create_queue<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: presentation_queue::ActiveModel,
    ) -> AppResult<presentation_queue::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump the queue version if it still equals `expected`.
    ///
    /// Returns `false` when another writer got there first.
    pub async fn compare_and_bump_version<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
        expected: i32,
    ) -> AppResult<bool> {
        let result = PresentationQueue::update_many()
            .col_expr(
                presentation_queue::Column::Version,
                Expr::col(presentation_queue::Column::Version).add(1),
            )
            .filter(presentation_queue::Column::EventId.eq(event_id))
            .filter(presentation_queue::Column::Version.eq(expected))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected == 1)
    }

    // === Entries ===

    /// Insert entries in bulk.
    pub async fn insert_entries<C: ConnectionTrait>(
        &self,
        conn: &C,
        models: Vec<presentation_entry::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }
        PresentationEntry::insert_many(models)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All entries of an event in queue order.
    pub async fn entries<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
    ) -> AppResult<Vec<presentation_entry::Model>> {
        PresentationEntry::find()
            .filter(presentation_entry::Column::EventId.eq(event_id))
            .order_by_asc(presentation_entry::Column::Position)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Entries of an event in a given state, in queue order.
    pub async fn entries_in_state(
        &self,
        event_id: &str,
        state: PresentationState,
    ) -> AppResult<Vec<presentation_entry::Model>> {
        PresentationEntry::find()
            .filter(presentation_entry::Column::EventId.eq(event_id))
            .filter(presentation_entry::Column::State.eq(state))
            .order_by_asc(presentation_entry::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Lowest-position entry in a given state.
    pub async fn first_in_state(
        &self,
        event_id: &str,
        state: PresentationState,
    ) -> AppResult<Option<presentation_entry::Model>> {
        PresentationEntry::find()
            .filter(presentation_entry::Column::EventId.eq(event_id))
            .filter(presentation_entry::Column::State.eq(state))
            .order_by_asc(presentation_entry::Column::Position)
            .limit(1)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A presenter's entry.
    pub async fn find_entry(
        &self,
        event_id: &str,
        presenter_id: &str,
    ) -> AppResult<Option<presentation_entry::Model>> {
        PresentationEntry::find()
            .filter(presentation_entry::Column::EventId.eq(event_id))
            .filter(presentation_entry::Column::PresenterId.eq(presenter_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of entries of an event in a given state.
    pub async fn count_in_state(&self, event_id: &str, state: PresentationState) -> AppResult<u64> {
        PresentationEntry::find()
            .filter(presentation_entry::Column::EventId.eq(event_id))
            .filter(presentation_entry::Column::State.eq(state))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an entry.
    pub async fn update_entry<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: presentation_entry::ActiveModel,
    ) -> AppResult<presentation_entry::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
