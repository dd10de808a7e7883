//! Voting window entity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::activity_option::ActivityCategory;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voting_window")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: String,

    pub starts_at: DateTimeUtc,

    pub ends_at: DateTimeUtc,

    /// Cleared once the winners are resolved.
    pub is_active: bool,

    /// Voters who have cast both categories.
    pub total_complete_voters: i32,

    #[sea_orm(nullable)]
    pub presentation_winner_id: Option<String>,

    #[sea_orm(nullable)]
    pub twist_winner_id: Option<String>,

    /// Set exactly once, by the first resolution after close.
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// Whether votes are accepted at `now`: `now ∈ [starts_at, ends_at)` and unresolved.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.resolved_at.is_none() && self.starts_at <= now && now < self.ends_at
    }

    /// Whether the window has closed (it may still be unresolved).
    #[must_use]
    pub fn has_closed_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at || !self.is_active
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Resolved winners keyed by category. Categories without votes are absent.
    #[must_use]
    pub fn winner_by_category(&self) -> BTreeMap<ActivityCategory, String> {
        let mut winners = BTreeMap::new();
        if let Some(id) = &self.presentation_winner_id {
            winners.insert(ActivityCategory::PresentationStyle, id.clone());
        }
        if let Some(id) = &self.twist_winner_id {
            winners.insert(ActivityCategory::SpeedDatingTwist, id.clone());
        }
        winners
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
