//! Session controller.
//!
//! The façade the HTTP layer talks to. It checks the caller's capability and
//! the lifecycle preconditions, then delegates to the catalog, the voting
//! session, the presentation queue and the rating ledger.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mixer_common::{AppError, AppResult, config::PresentationConfig};
use mixer_db::{
    entities::{ActivityCategory, PresentationState, activity_option, presentation_entry, voting_window},
    repositories::{
        ActivityOptionRepository, EventRepository, PresentationRepository, RatingRepository,
        VoteRepository, VotingWindowRepository,
    },
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info};

use super::access::{DbEventAccess, SharedEventAccess};
use super::activity_catalog::ActivityCatalogService;
use super::ordering::{OrderingStrategy, strategy_for};
use super::presentation_queue::{AdvanceOutcome, PresentationQueueService, QueueProgress};
use super::rating_ledger::{PresenterScore, RatingLedgerService, validate_rating};
use super::vote_ledger::VoteLedger;
use super::voting_session::{BallotAction, VotingSessionService};

/// Seconds left of a presentation that started at `started_at`, never negative.
#[must_use]
pub fn time_remaining(started_at: DateTime<Utc>, now: DateTime<Utc>, duration_seconds: i64) -> i64 {
    (duration_seconds - (now - started_at).num_seconds()).max(0)
}

/// Active options of both categories.
#[derive(Debug, Clone)]
pub struct ActivityMenu {
    pub presentation_styles: Vec<activity_option::Model>,
    pub twists: Vec<activity_option::Model>,
}

/// Both halves of a ballot as submitted. Either may be missing.
#[derive(Debug, Clone, Default)]
pub struct BallotInput {
    pub presentation_option_id: Option<String>,
    pub twist_option_id: Option<String>,
}

/// Voting state as seen by one attendee.
///
/// Tallies and winners are only revealed once the window is resolved.
#[derive(Debug, Clone)]
pub struct VotingView {
    pub is_open: bool,
    pub has_voted_both: bool,
    pub window: Option<voting_window::Model>,
    pub tallies: Option<BTreeMap<ActivityCategory, BTreeMap<String, i64>>>,
    pub winners: Option<BTreeMap<ActivityCategory, String>>,
}

/// Result of a coach resolving the vote.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub window: voting_window::Model,
    pub newly_resolved: bool,
    pub queue_seeded: bool,
}

/// What the polling screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentPresentation {
    Presenting {
        entry: presentation_entry::Model,
        presenter_name: String,
        time_remaining: i64,
        user_has_rated: bool,
    },
    Idle {
        all_completed: bool,
        completed_count: u64,
        total_count: u64,
    },
}

/// Advance outcome with the display name of whoever is presenting.
#[derive(Debug, Clone)]
pub struct AdvanceResult {
    pub outcome: AdvanceOutcome,
    pub presenter_name: Option<String>,
}

/// The caller's own scores.
#[derive(Debug, Clone)]
pub struct MyScores {
    pub average_score: Option<f64>,
    pub rating_count: i64,
    /// 1-based position in the rankings, `None` while unrated.
    pub rank: Option<usize>,
    pub total_participants: u64,
    pub distribution: [i64; 5],
}

/// One line of the rankings.
#[derive(Debug, Clone)]
pub struct RankingRow {
    pub rank: usize,
    pub presenter_name: String,
    pub score: PresenterScore,
}

/// One queue slot with its presenter's name.
#[derive(Debug, Clone)]
pub struct QueueSlot {
    pub entry: presentation_entry::Model,
    pub presenter_name: String,
}

/// Coach overview of the queue.
#[derive(Debug, Clone)]
pub struct QueueOverview {
    pub progress: Option<QueueProgress>,
    pub slots: Vec<QueueSlot>,
    /// Presenter id of the lowest waiting entry.
    pub up_next: Option<String>,
}

/// Session controller.
#[derive(Clone)]
pub struct SessionController {
    access: SharedEventAccess,
    ordering: Arc<dyn OrderingStrategy>,
    catalog: ActivityCatalogService,
    voting: VotingSessionService,
    queue: PresentationQueueService,
    ratings: RatingLedgerService,
    duration_seconds: i64,
}

impl SessionController {
    /// Create a new session controller.
    #[must_use]
    pub fn new(
        access: SharedEventAccess,
        ordering: Arc<dyn OrderingStrategy>,
        catalog: ActivityCatalogService,
        voting: VotingSessionService,
        queue: PresentationQueueService,
        ratings: RatingLedgerService,
        duration_seconds: i64,
    ) -> Self {
        Self {
            access,
            ordering,
            catalog,
            voting,
            queue,
            ratings,
            duration_seconds,
        }
    }

    /// Wire every service over one database connection.
    #[must_use]
    pub fn from_database(db: Arc<DatabaseConnection>, config: &PresentationConfig) -> Self {
        let catalog = ActivityCatalogService::new(ActivityOptionRepository::new(Arc::clone(&db)));
        let votes = VoteLedger::new(VoteRepository::new(Arc::clone(&db)), catalog.clone());
        let voting = VotingSessionService::new(
            VotingWindowRepository::new(Arc::clone(&db)),
            votes,
            catalog.clone(),
        );
        let queue = PresentationQueueService::new(PresentationRepository::new(Arc::clone(&db)));
        let ratings = RatingLedgerService::new(RatingRepository::new(Arc::clone(&db)));
        let access = Arc::new(DbEventAccess::new(EventRepository::new(db)));

        Self::new(
            access,
            strategy_for(config.ordering),
            catalog,
            voting,
            queue,
            ratings,
            config.duration_seconds,
        )
    }

    /// Replace the queue ordering strategy.
    #[must_use]
    pub fn with_ordering(mut self, ordering: Arc<dyn OrderingStrategy>) -> Self {
        self.ordering = ordering;
        self
    }

    /// The activity catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ActivityCatalogService {
        &self.catalog
    }

    // === Capability checks ===

    async fn require_event(&self, event_id: &str) -> AppResult<()> {
        if self.access.event_exists(event_id).await? {
            Ok(())
        } else {
            Err(AppError::EventNotFound(event_id.to_string()))
        }
    }

    async fn require_attendee(&self, event_id: &str, user_id: &str) -> AppResult<()> {
        self.require_event(event_id).await?;
        if !self.access.is_confirmed_attendee(event_id, user_id).await? {
            return Err(AppError::Forbidden(
                "Not a confirmed attendee of this event".to_string(),
            ));
        }
        Ok(())
    }

    async fn require_coach(&self, event_id: &str, user_id: &str) -> AppResult<()> {
        self.require_event(event_id).await?;
        if !self.access.is_coach(event_id, user_id).await? {
            return Err(AppError::Forbidden(
                "Only the coach can control this event".to_string(),
            ));
        }
        Ok(())
    }

    async fn presenter_name(&self, event_id: &str, presenter_id: &str) -> AppResult<String> {
        Ok(self
            .access
            .display_name(event_id, presenter_id)
            .await?
            .unwrap_or_else(|| presenter_id.to_string()))
    }

    async fn roster_names(&self, event_id: &str) -> AppResult<HashMap<String, String>> {
        Ok(self
            .access
            .confirmed_roster(event_id)
            .await?
            .into_iter()
            .map(|m| (m.user_id, m.display_name))
            .collect())
    }

    // === Voting ===

    /// Active options an attendee can vote for.
    pub async fn list_activities(&self, event_id: &str, user_id: &str) -> AppResult<ActivityMenu> {
        self.require_attendee(event_id, user_id).await?;
        Ok(ActivityMenu {
            presentation_styles: self
                .catalog
                .list_active(ActivityCategory::PresentationStyle)
                .await?,
            twists: self
                .catalog
                .list_active(ActivityCategory::SpeedDatingTwist)
                .await?,
        })
    }

    /// Submit a vote in both categories.
    pub async fn submit_ballot(
        &self,
        event_id: &str,
        user_id: &str,
        input: BallotInput,
    ) -> AppResult<BallotAction> {
        self.require_attendee(event_id, user_id).await?;

        let (Some(presentation), Some(twist)) =
            (input.presentation_option_id, input.twist_option_id)
        else {
            return Err(AppError::Validation(
                "Both a presentation style and a twist are required".to_string(),
            ));
        };

        self.voting
            .record_ballot(event_id, user_id, &presentation, &twist)
            .await
    }

    /// Voting state without side effects.
    pub async fn voting_status(&self, event_id: &str, user_id: &str) -> AppResult<VotingView> {
        self.require_attendee(event_id, user_id).await?;
        self.voting_view(event_id, user_id).await
    }

    /// Voting results, resolving the window if it has closed.
    pub async fn voting_results(&self, event_id: &str, user_id: &str) -> AppResult<VotingView> {
        self.require_attendee(event_id, user_id).await?;

        let needs_resolution = self
            .voting
            .window(event_id)
            .await?
            .is_some_and(|w| !w.is_resolved() && w.has_closed_at(Utc::now()));
        if needs_resolution {
            self.resolve_and_seed(event_id).await?;
        }

        self.voting_view(event_id, user_id).await
    }

    async fn voting_view(&self, event_id: &str, user_id: &str) -> AppResult<VotingView> {
        let snapshot = self.voting.status(event_id, user_id).await?;
        let resolved = snapshot
            .window
            .as_ref()
            .is_some_and(voting_window::Model::is_resolved);

        let (tallies, winners) = if resolved {
            let winners = snapshot
                .window
                .as_ref()
                .map(voting_window::Model::winner_by_category);
            (Some(self.voting.tallies(event_id).await?), winners)
        } else {
            (None, None)
        };

        Ok(VotingView {
            is_open: snapshot.is_open,
            has_voted_both: snapshot.ballot.is_complete(),
            window: snapshot.window,
            tallies,
            winners,
        })
    }

    /// Open the voting window.
    pub async fn open_voting(
        &self,
        event_id: &str,
        coach_id: &str,
        starts_at: Option<DateTime<Utc>>,
        ends_at: DateTime<Utc>,
    ) -> AppResult<voting_window::Model> {
        self.require_coach(event_id, coach_id).await?;
        self.voting.open(event_id, starts_at, ends_at).await
    }

    /// Close the voting window early.
    pub async fn close_voting(
        &self,
        event_id: &str,
        coach_id: &str,
    ) -> AppResult<voting_window::Model> {
        self.require_coach(event_id, coach_id).await?;
        self.voting.close(event_id).await
    }

    /// Resolve the winners and seed the presentation queue.
    pub async fn resolve_voting(&self, event_id: &str, coach_id: &str) -> AppResult<Resolution> {
        self.require_coach(event_id, coach_id).await?;
        self.resolve_and_seed(event_id).await
    }

    /// Resolution and seeding share one transaction, so the queue is seeded
    /// exactly when the window is resolved for the first time.
    async fn resolve_and_seed(&self, event_id: &str) -> AppResult<Resolution> {
        if let Some(window) = self.voting.window(event_id).await? {
            if window.is_resolved() {
                return Ok(Resolution {
                    window,
                    newly_resolved: false,
                    queue_seeded: false,
                });
            }
        }

        let roster = self.access.confirmed_roster(event_id).await?;
        let presenters = self.ordering.order(&roster);

        let txn = self.voting.begin().await?;
        let outcome = self.voting.resolve(&txn, event_id).await?;
        let queue_seeded = if outcome.newly_resolved {
            self.queue.seed(&txn, event_id, &presenters).await?
        } else {
            false
        };
        txn.commit().await?;

        if queue_seeded {
            info!(event_id = %event_id, presenters = presenters.len(), "Voting resolved, queue ready");
        }

        Ok(Resolution {
            window: outcome.window,
            newly_resolved: outcome.newly_resolved,
            queue_seeded,
        })
    }

    // === Presentations ===

    /// Who is presenting right now, for attendee polling.
    pub async fn poll_current(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<CurrentPresentation> {
        self.require_attendee(event_id, user_id).await?;

        if let Some(entry) = self.queue.current(event_id).await? {
            let presenter_name = self.presenter_name(event_id, &entry.presenter_id).await?;
            let user_has_rated = self
                .ratings
                .has_rated(event_id, &entry.presenter_id, user_id)
                .await?;
            let remaining = entry.started_at.map_or(self.duration_seconds, |started_at| {
                time_remaining(started_at, Utc::now(), self.duration_seconds)
            });

            return Ok(CurrentPresentation::Presenting {
                entry,
                presenter_name,
                time_remaining: remaining,
                user_has_rated,
            });
        }

        let progress = self.queue.progress(event_id).await?;
        Ok(progress.map_or(
            CurrentPresentation::Idle {
                all_completed: false,
                completed_count: 0,
                total_count: 0,
            },
            |p| CurrentPresentation::Idle {
                all_completed: p.is_finished(),
                completed_count: p.completed_count,
                total_count: p.total_count,
            },
        ))
    }

    /// Rate the presenter currently on stage. Returns the stored value.
    pub async fn rate(
        &self,
        event_id: &str,
        presenter_id: &str,
        rater_id: &str,
        value: i32,
    ) -> AppResult<i32> {
        self.require_attendee(event_id, rater_id).await?;
        validate_rating(presenter_id, rater_id, value)?;

        let entry = self
            .queue
            .entry(event_id, presenter_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Presenter not in queue: {presenter_id}")))?;
        if entry.state != PresentationState::Presenting {
            return Err(AppError::InvalidState(
                "Presenter is not currently presenting".to_string(),
            ));
        }

        self.ratings
            .rate(event_id, presenter_id, rater_id, value)
            .await?;
        Ok(value)
    }

    /// Advance the queue on behalf of the coach.
    pub async fn advance(
        &self,
        event_id: &str,
        coach_id: &str,
        expected_version: Option<i32>,
    ) -> AppResult<AdvanceResult> {
        self.require_coach(event_id, coach_id).await?;

        let outcome = self.queue.advance(event_id, expected_version).await?;
        let presenter_id = match &outcome {
            AdvanceOutcome::Presenting { entry, .. } => Some(entry.presenter_id.clone()),
            AdvanceOutcome::Superseded { current, .. } => {
                current.as_ref().map(|e| e.presenter_id.clone())
            }
            AdvanceOutcome::AllCompleted { .. } => None,
        };
        let presenter_name = match presenter_id {
            Some(id) => Some(self.presenter_name(event_id, &id).await?),
            None => None,
        };

        debug!(event_id = %event_id, ?presenter_name, "Advance handled");
        Ok(AdvanceResult {
            outcome,
            presenter_name,
        })
    }

    /// The caller's own average, rank and distribution.
    pub async fn my_scores(&self, event_id: &str, user_id: &str) -> AppResult<MyScores> {
        self.require_attendee(event_id, user_id).await?;

        let distribution = self.ratings.distribution(event_id, user_id).await?;
        let score = PresenterScore::from_distribution(user_id, &distribution);
        let rank = self
            .ratings
            .rankings(event_id)
            .await?
            .iter()
            .position(|s| s.presenter_id == user_id)
            .map(|i| i + 1);
        let total_participants = self
            .queue
            .progress(event_id)
            .await?
            .map_or(0, |p| p.total_count);

        Ok(MyScores {
            average_score: (score.count > 0).then(|| score.average()),
            rating_count: score.count,
            rank,
            total_participants,
            distribution,
        })
    }

    /// Rankings of every rated presenter.
    pub async fn rankings(&self, event_id: &str, coach_id: &str) -> AppResult<Vec<RankingRow>> {
        self.require_coach(event_id, coach_id).await?;

        let names = self.roster_names(event_id).await?;
        Ok(self
            .ratings
            .rankings(event_id)
            .await?
            .into_iter()
            .zip(1..)
            .map(|(score, rank)| RankingRow {
                rank,
                presenter_name: names
                    .get(&score.presenter_id)
                    .cloned()
                    .unwrap_or_else(|| score.presenter_id.clone()),
                score,
            })
            .collect())
    }

    /// Every queue slot with progress, for the coach screen.
    pub async fn queue_overview(&self, event_id: &str, coach_id: &str) -> AppResult<QueueOverview> {
        self.require_coach(event_id, coach_id).await?;

        let names = self.roster_names(event_id).await?;
        let progress = self.queue.progress(event_id).await?;
        let slots = self
            .queue
            .entries(event_id)
            .await?
            .into_iter()
            .map(|entry| QueueSlot {
                presenter_name: names
                    .get(&entry.presenter_id)
                    .cloned()
                    .unwrap_or_else(|| entry.presenter_id.clone()),
                entry,
            })
            .collect();
        let up_next = self.queue.next(event_id).await?.map(|e| e.presenter_id);

        Ok(QueueOverview {
            progress,
            slots,
            up_next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_remaining_counts_down() {
        let started = Utc::now();
        assert_eq!(time_remaining(started, started, 90), 90);
        assert_eq!(time_remaining(started, started + Duration::seconds(30), 90), 60);
    }

    #[test]
    fn test_time_remaining_never_negative() {
        let started = Utc::now();
        assert_eq!(time_remaining(started, started + Duration::seconds(500), 90), 0);
    }
}
