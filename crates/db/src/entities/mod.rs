//! Database entities.

#![allow(missing_docs)]

pub mod activity_option;
pub mod event;
pub mod event_attendee;
pub mod presentation_entry;
pub mod presentation_queue;
pub mod rating;
pub mod vote;
pub mod voting_window;

pub use activity_option::{ActivityCategory, Entity as ActivityOption};
pub use event::Entity as Event;
pub use event_attendee::{AttendeeStatus, Entity as EventAttendee};
pub use presentation_entry::{Entity as PresentationEntry, PresentationState};
pub use presentation_queue::Entity as PresentationQueue;
pub use rating::Entity as Rating;
pub use vote::Entity as Vote;
pub use voting_window::Entity as VotingWindow;
