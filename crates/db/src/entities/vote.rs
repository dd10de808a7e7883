//! Vote entity.
//!
//! At most one row per (event, voter, category); a resubmission overwrites it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::activity_option::ActivityCategory;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    pub voter_id: String,

    pub category: ActivityCategory,

    pub option_id: String,

    pub cast_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activity_option::Entity",
        from = "Column::OptionId",
        to = "super::activity_option::Column::Id",
        on_delete = "Restrict"
    )]
    ActivityOption,
}

impl Related<super::activity_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityOption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
