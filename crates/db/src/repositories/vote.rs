//! Vote repository.

use std::sync::Arc;

use crate::entities::{ActivityCategory, Vote, vote};
use mixer_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    sea_query::OnConflict,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a voter's vote in one category.
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
        voter_id: &str,
        category: ActivityCategory,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::EventId.eq(event_id))
            .filter(vote::Column::VoterId.eq(voter_id))
            .filter(vote::Column::Category.eq(category))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All of a voter's votes for an event.
    pub async fn find_by_voter(&self, event_id: &str, voter_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::EventId.eq(event_id))
            .filter(vote::Column::VoterId.eq(voter_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert the vote, or overwrite the option and timestamp of the existing
    /// (event, voter, category) row.
    pub async fn upsert<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: vote::ActiveModel,
    ) -> AppResult<()> {
        Vote::insert(model)
            .on_conflict(
                OnConflict::columns([
                    vote::Column::EventId,
                    vote::Column::VoterId,
                    vote::Column::Category,
                ])
                .update_columns([vote::Column::OptionId, vote::Column::CastAt])
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Vote counts per option for one category.
    pub async fn tally<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
        category: ActivityCategory,
    ) -> AppResult<Vec<(String, i64)>> {
        Vote::find()
            .select_only()
            .column(vote::Column::OptionId)
            .column_as(vote::Column::Id.count(), "votes")
            .filter(vote::Column::EventId.eq(event_id))
            .filter(vote::Column::Category.eq(category))
            .group_by(vote::Column::OptionId)
            .into_tuple::<(String, i64)>()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
