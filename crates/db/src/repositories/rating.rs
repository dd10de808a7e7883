//! Rating repository.

use std::sync::Arc;

use crate::entities::{Rating, rating};
use mixer_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    sea_query::OnConflict,
};

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert the rating, or overwrite value and timestamp of the existing
    /// (event, presenter, rater) row.
    pub async fn upsert(&self, model: rating::ActiveModel) -> AppResult<()> {
        Rating::insert(model)
            .on_conflict(
                OnConflict::columns([
                    rating::Column::EventId,
                    rating::Column::PresenterId,
                    rating::Column::RaterId,
                ])
                .update_columns([rating::Column::Value, rating::Column::RatedAt])
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find one rater's rating of a presenter.
    pub async fn find(
        &self,
        event_id: &str,
        presenter_id: &str,
        rater_id: &str,
    ) -> AppResult<Option<rating::Model>> {
        Rating::find()
            .filter(rating::Column::EventId.eq(event_id))
            .filter(rating::Column::PresenterId.eq(presenter_id))
            .filter(rating::Column::RaterId.eq(rater_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of ratings a presenter received.
    pub async fn count_for_presenter(&self, event_id: &str, presenter_id: &str) -> AppResult<u64> {
        Rating::find()
            .filter(rating::Column::EventId.eq(event_id))
            .filter(rating::Column::PresenterId.eq(presenter_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// `(presenter_id, sum, count)` for every rated presenter of an event.
    pub async fn presenter_totals(&self, event_id: &str) -> AppResult<Vec<(String, i64, i64)>> {
        Rating::find()
            .select_only()
            .column(rating::Column::PresenterId)
            .column_as(rating::Column::Value.sum(), "total")
            .column_as(rating::Column::Id.count(), "ratings")
            .filter(rating::Column::EventId.eq(event_id))
            .group_by(rating::Column::PresenterId)
            .into_tuple::<(String, i64, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// `(value, count)` pairs of a presenter's ratings.
    pub async fn value_counts(&self, event_id: &str, presenter_id: &str) -> AppResult<Vec<(i32, i64)>> {
        Rating::find()
            .select_only()
            .column(rating::Column::Value)
            .column_as(rating::Column::Id.count(), "ratings")
            .filter(rating::Column::EventId.eq(event_id))
            .filter(rating::Column::PresenterId.eq(presenter_id))
            .group_by(rating::Column::Value)
            .into_tuple::<(i32, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
