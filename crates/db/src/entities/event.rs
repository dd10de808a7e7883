//! Event entity.
//!
//! Events are owned by the event-management workflow; this service only reads
//! them to answer capability checks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    /// User who runs the live session (the coach).
    #[sea_orm(indexed)]
    pub coach_id: String,

    #[sea_orm(nullable)]
    pub scheduled_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_attendee::Entity")]
    EventAttendee,
}

impl Related<super::event_attendee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventAttendee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
