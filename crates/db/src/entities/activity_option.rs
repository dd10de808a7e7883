//! Activity option entity.
//!
//! Options are referenced by votes and are therefore never deleted, only
//! deactivated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The two independent categories attendees vote on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityCategory {
    /// How attendees present themselves.
    #[sea_orm(string_value = "presentation_style")]
    PresentationStyle,
    /// The twist applied to the speed-dating rounds.
    #[sea_orm(string_value = "speed_dating_twist")]
    SpeedDatingTwist,
}

impl ActivityCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 2] = [Self::PresentationStyle, Self::SpeedDatingTwist];

    /// Human readable name, used in error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PresentationStyle => "presentation style",
            Self::SpeedDatingTwist => "speed dating twist",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_option")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub category: ActivityCategory,

    /// Stable machine key, unique within a category.
    pub variant: String,

    pub label: String,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    pub is_active: bool,

    /// Display order; also the tie-break when resolving winners (lowest wins).
    pub sort_order: i32,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
