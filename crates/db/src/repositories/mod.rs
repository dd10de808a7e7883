//! Repositories.
//!
//! Methods that take a `conn` argument may run inside a caller-owned
//! transaction; the rest use the pooled connection directly.

#![allow(missing_docs)]

pub mod activity_option;
pub mod event;
pub mod presentation;
pub mod rating;
pub mod vote;
pub mod voting_window;

pub use activity_option::ActivityOptionRepository;
pub use event::EventRepository;
pub use presentation::PresentationRepository;
pub use rating::RatingRepository;
pub use vote::VoteRepository;
pub use voting_window::VotingWindowRepository;
