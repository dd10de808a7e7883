//! Activity catalog service.

use chrono::Utc;
use mixer_common::{AppError, AppResult, IdGenerator};
use mixer_db::{
    entities::{ActivityCategory, activity_option},
    repositories::ActivityOptionRepository,
};
use sea_orm::{ConnectionTrait, Set};
use tracing::info;

/// A built-in option installed into an empty catalog.
struct DefaultOption {
    category: ActivityCategory,
    variant: &'static str,
    label: &'static str,
    description: &'static str,
    sort_order: i32,
}

const DEFAULT_OPTIONS: &[DefaultOption] = &[
    DefaultOption {
        category: ActivityCategory::PresentationStyle,
        variant: "elevator_pitch",
        label: "Elevator Pitch",
        description: "Introduce yourself as if you only had one elevator ride.",
        sort_order: 1,
    },
    DefaultOption {
        category: ActivityCategory::PresentationStyle,
        variant: "two_truths_one_lie",
        label: "Two Truths and a Lie",
        description: "Share three facts about yourself. The room guesses the lie.",
        sort_order: 2,
    },
    DefaultOption {
        category: ActivityCategory::PresentationStyle,
        variant: "show_and_tell",
        label: "Show and Tell",
        description: "Bring one object or photo and tell its story.",
        sort_order: 3,
    },
    DefaultOption {
        category: ActivityCategory::SpeedDatingTwist,
        variant: "rapid_fire",
        label: "Rapid Fire",
        description: "Short rounds, quick questions, no time to overthink.",
        sort_order: 1,
    },
    DefaultOption {
        category: ActivityCategory::SpeedDatingTwist,
        variant: "question_cards",
        label: "Question Cards",
        description: "Draw a card and answer whatever is on it.",
        sort_order: 2,
    },
    DefaultOption {
        category: ActivityCategory::SpeedDatingTwist,
        variant: "role_swap",
        label: "Role Swap",
        description: "Each pair interviews the other as their own character.",
        sort_order: 3,
    },
];

/// Read-mostly catalog of activity options.
#[derive(Clone)]
pub struct ActivityCatalogService {
    option_repo: ActivityOptionRepository,
    id_gen: IdGenerator,
}

impl ActivityCatalogService {
    /// Create a new activity catalog service.
    #[must_use]
    pub const fn new(option_repo: ActivityOptionRepository) -> Self {
        Self {
            option_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Active options of a category, ordered by sort order.
    pub async fn list_active(
        &self,
        category: ActivityCategory,
    ) -> AppResult<Vec<activity_option::Model>> {
        self.option_repo.list_active(category).await
    }

    /// Get an option by ID.
    pub async fn get(&self, id: &str) -> AppResult<activity_option::Model> {
        self.option_repo
            .get_by_id(self.option_repo.connection(), id)
            .await
    }

    /// Every option of a category, inactive ones included.
    ///
    /// Used for tie-breaking: an option may be deactivated after it received
    /// votes.
    pub async fn options_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        category: ActivityCategory,
    ) -> AppResult<Vec<activity_option::Model>> {
        self.option_repo.list_by_category(conn, category).await
    }

    /// Check that `option_id` names an active option of `category`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Validation` for an inactive option or
    /// one from the other category.
    pub async fn validate_choice<C: ConnectionTrait>(
        &self,
        conn: &C,
        option_id: &str,
        category: ActivityCategory,
    ) -> AppResult<activity_option::Model> {
        let option = self.option_repo.get_by_id(conn, option_id).await?;

        if option.category != category {
            return Err(AppError::Validation(format!(
                "Option {option_id} does not belong to {}",
                category.as_str()
            )));
        }
        if !option.is_active {
            return Err(AppError::Validation(format!(
                "Option {option_id} is not active"
            )));
        }

        Ok(option)
    }

    /// Remove an option from future ballots. Existing votes are kept.
    pub async fn deactivate(&self, id: &str) -> AppResult<activity_option::Model> {
        let option = self.option_repo.set_active(id, false).await?;
        info!(option_id = %id, variant = %option.variant, "Deactivated activity option");
        Ok(option)
    }

    /// Install the built-in options when the catalog is empty.
    ///
    /// Returns the number of options inserted.
    pub async fn install_defaults(&self) -> AppResult<usize> {
        let txn = self.option_repo.begin().await?;
        if self.option_repo.count(&txn).await? > 0 {
            txn.rollback().await?;
            return Ok(0);
        }

        let now = Utc::now();
        let models = DEFAULT_OPTIONS
            .iter()
            .map(|option| activity_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                category: Set(option.category),
                variant: Set(option.variant.to_string()),
                label: Set(option.label.to_string()),
                description: Set(Some(option.description.to_string())),
                is_active: Set(true),
                sort_order: Set(option.sort_order),
                created_at: Set(now),
            })
            .collect();
        self.option_repo.insert_many(&txn, models).await?;
        txn.commit().await?;

        info!(count = DEFAULT_OPTIONS.len(), "Installed default activity options");
        Ok(DEFAULT_OPTIONS.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn option(category: ActivityCategory, is_active: bool) -> activity_option::Model {
        activity_option::Model {
            id: "opt1".to_string(),
            category,
            variant: "rapid_fire".to_string(),
            label: "Rapid Fire".to_string(),
            description: None,
            is_active,
            sort_order: 1,
            created_at: Utc::now(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> ActivityCatalogService {
        ActivityCatalogService::new(ActivityOptionRepository::new(Arc::new(db)))
    }

    #[test]
    fn test_default_options_cover_both_categories() {
        for category in ActivityCategory::ALL {
            let mut orders: Vec<i32> = DEFAULT_OPTIONS
                .iter()
                .filter(|o| o.category == category)
                .map(|o| o.sort_order)
                .collect();
            orders.sort_unstable();
            assert_eq!(orders, [1, 2, 3]);
        }
    }

    #[tokio::test]
    async fn test_validate_choice_rejects_wrong_category() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[option(ActivityCategory::SpeedDatingTwist, true)]])
            .into_connection();
        let svc = service(db);

        let result = svc
            .validate_choice(
                svc.option_repo.connection(),
                "opt1",
                ActivityCategory::PresentationStyle,
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_validate_choice_rejects_inactive_option() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[option(ActivityCategory::SpeedDatingTwist, false)]])
            .into_connection();
        let svc = service(db);

        let result = svc
            .validate_choice(
                svc.option_repo.connection(),
                "opt1",
                ActivityCategory::SpeedDatingTwist,
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_validate_choice_unknown_option() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<activity_option::Model>::new()])
            .into_connection();
        let svc = service(db);

        let result = svc
            .validate_choice(
                svc.option_repo.connection(),
                "missing",
                ActivityCategory::SpeedDatingTwist,
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
