//! Activity option repository.

use std::sync::Arc;

use crate::entities::{ActivityCategory, ActivityOption, activity_option};
use mixer_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// Activity option repository for database operations.
#[derive(Clone)]
pub struct ActivityOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityOptionRepository {
    /// Create a new activity option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The pooled connection, for callers outside a transaction.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Begin a transaction on the pooled connection.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an option by ID.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<activity_option::Model>> {
        ActivityOption::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an option by ID, returning error if not found.
    pub async fn get_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<activity_option::Model> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity option not found: {id}")))
    }

    /// Active options of a category ordered by `sort_order`.
    pub async fn list_active(
        &self,
        category: ActivityCategory,
    ) -> AppResult<Vec<activity_option::Model>> {
        ActivityOption::find()
            .filter(activity_option::Column::Category.eq(category))
            .filter(activity_option::Column::IsActive.eq(true))
            .order_by_asc(activity_option::Column::SortOrder)
            .order_by_asc(activity_option::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every option of a category, including deactivated ones.
    pub async fn list_by_category<C: ConnectionTrait>(
        &self,
        conn: &C,
        category: ActivityCategory,
    ) -> AppResult<Vec<activity_option::Model>> {
        ActivityOption::find()
            .filter(activity_option::Column::Category.eq(category))
            .order_by_asc(activity_option::Column::SortOrder)
            .order_by_asc(activity_option::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of options in the catalog.
    pub async fn count<C: ConnectionTrait>(&self, conn: &C) -> AppResult<u64> {
        ActivityOption::find()
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new option.
    pub async fn create(
        &self,
        model: activity_option::ActiveModel,
    ) -> AppResult<activity_option::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert several options at once.
    pub async fn insert_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        models: Vec<activity_option::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }
        ActivityOption::insert_many(models)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Toggle the active flag of an option.
    pub async fn set_active(&self, id: &str, is_active: bool) -> AppResult<activity_option::Model> {
        let option = self.get_by_id(self.db.as_ref(), id).await?;
        let mut active: activity_option::ActiveModel = option.into();
        active.is_active = Set(is_active);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
