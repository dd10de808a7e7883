//! Core business logic for mixer.
//!
//! Live event orchestration: attendees vote on an activity format, the coach
//! walks the room through a presentation queue, and peers rate each presenter.

pub mod services;

pub use services::*;
