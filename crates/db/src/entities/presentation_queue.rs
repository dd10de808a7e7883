//! Presentation queue entity.
//!
//! One row per seeded event. `version` is bumped on every queue transition and
//! is the compare-and-swap guard for `advance`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "presentation_queue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: String,

    pub version: i32,

    pub total_count: i32,

    pub seeded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::presentation_entry::Entity")]
    PresentationEntry,
}

impl Related<super::presentation_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PresentationEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
