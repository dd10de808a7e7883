//! Event attendee entity (registration roster).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registration status of an attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AttendeeStatus {
    /// Registered, awaiting confirmation.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Confirmed; may vote, rate and present.
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Registration withdrawn.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl AttendeeStatus {
    /// Whether this status grants voting/rating/presenting.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_attendee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    /// Name shown while the attendee presents.
    pub display_name: String,

    pub status: AttendeeStatus,

    pub registered_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
