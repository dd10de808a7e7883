//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod activity_catalog;
pub mod ordering;
pub mod presentation_queue;
pub mod rating_ledger;
pub mod session;
pub mod vote_ledger;
pub mod voting_session;

pub use access::{DbEventAccess, EventAccess, RosterMember, SharedEventAccess};
pub use activity_catalog::ActivityCatalogService;
pub use ordering::{OrderingStrategy, RegistrationOrder, ShuffledOrder, strategy_for};
pub use presentation_queue::{AdvanceOutcome, PresentationQueueService, QueueProgress};
pub use rating_ledger::{MAX_RATING, MIN_RATING, PresenterScore, RatingLedgerService};
pub use session::{
    ActivityMenu, AdvanceResult, BallotInput, CurrentPresentation, MyScores, QueueOverview,
    QueueSlot, RankingRow, Resolution, SessionController, VotingView, time_remaining,
};
pub use vote_ledger::{Ballot, VoteLedger};
pub use voting_session::{BallotAction, ResolveOutcome, VotingSessionService, VotingSnapshot};
