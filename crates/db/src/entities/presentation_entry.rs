//! Presentation entry entity: one attendee's slot in the queue.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Slot state. Transitions are strictly `Waiting -> Presenting -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresentationState {
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "presenting")]
    Presenting,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl PresentationState {
    /// Whether `self -> next` is a permitted transition.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Presenting) | (Self::Presenting, Self::Completed)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "presentation_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    pub presenter_id: String,

    /// Dense 1..N order within the event.
    pub position: i32,

    pub state: PresentationState,

    #[sea_orm(nullable)]
    pub started_at: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::presentation_queue::Entity",
        from = "Column::EventId",
        to = "super::presentation_queue::Column::EventId",
        on_delete = "Cascade"
    )]
    PresentationQueue,
}

impl Related<super::presentation_queue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PresentationQueue.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_forward_transitions() {
        use PresentationState::{Completed, Presenting, Waiting};
        assert!(Waiting.can_transition_to(Presenting));
        assert!(Presenting.can_transition_to(Completed));
        assert!(!Waiting.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Waiting));
        assert!(!Completed.can_transition_to(Presenting));
        assert!(!Presenting.can_transition_to(Waiting));
    }
}
