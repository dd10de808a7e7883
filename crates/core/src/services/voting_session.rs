//! Voting session service.
//!
//! A window opens once per event, accepts ballots while
//! `now ∈ [starts_at, ends_at)`, and is resolved exactly once after it closes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mixer_common::{AppError, AppResult};
use mixer_db::{
    entities::{ActivityCategory, activity_option, voting_window},
    repositories::VotingWindowRepository,
};
use sea_orm::{DatabaseTransaction, Set};
use serde::Serialize;
use tracing::{debug, info};

use super::activity_catalog::ActivityCatalogService;
use super::vote_ledger::{Ballot, VoteLedger};

/// Whether a ballot created the voter's votes or replaced earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BallotAction {
    Created,
    Updated,
}

/// A voter's view of the session.
#[derive(Debug, Clone)]
pub struct VotingSnapshot {
    pub window: Option<voting_window::Model>,
    pub is_open: bool,
    pub ballot: Ballot,
}

/// Result of resolving a window.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub window: voting_window::Model,
    /// `false` when an earlier call already resolved the window.
    pub newly_resolved: bool,
}

/// Pick the winning option of one category.
///
/// Highest count wins; ties go to the lowest `sort_order`, then the lowest id.
/// Returns `None` when the category received no votes.
#[must_use]
pub fn pick_winner(
    tally: &BTreeMap<String, i64>,
    options: &[activity_option::Model],
) -> Option<String> {
    let sort_order = |id: &str| {
        options
            .iter()
            .find(|o| o.id == id)
            .map_or(i32::MAX, |o| o.sort_order)
    };

    tally
        .iter()
        .filter(|(_, count)| **count > 0)
        .min_by(|(a_id, a_count), (b_id, b_count)| {
            b_count
                .cmp(a_count)
                .then_with(|| sort_order(a_id).cmp(&sort_order(b_id)))
                .then_with(|| a_id.cmp(b_id))
        })
        .map(|(id, _)| id.clone())
}

/// Voting session service.
#[derive(Clone)]
pub struct VotingSessionService {
    window_repo: VotingWindowRepository,
    votes: VoteLedger,
    catalog: ActivityCatalogService,
}

impl VotingSessionService {
    /// Create a new voting session service.
    #[must_use]
    pub const fn new(
        window_repo: VotingWindowRepository,
        votes: VoteLedger,
        catalog: ActivityCatalogService,
    ) -> Self {
        Self {
            window_repo,
            votes,
            catalog,
        }
    }

    /// Start a transaction for callers that combine resolution with other writes.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.window_repo.begin().await
    }

    /// Open the event's voting window.
    ///
    /// Opening is idempotent: an existing window is returned unchanged.
    pub async fn open(
        &self,
        event_id: &str,
        starts_at: Option<DateTime<Utc>>,
        ends_at: DateTime<Utc>,
    ) -> AppResult<voting_window::Model> {
        let now = Utc::now();
        let starts_at = starts_at.unwrap_or(now);
        if ends_at <= starts_at {
            return Err(AppError::Validation(
                "Voting must end after it starts".to_string(),
            ));
        }

        if let Some(existing) = self.window_repo.find(event_id).await? {
            debug!(event_id = %event_id, "Voting window already open");
            return Ok(existing);
        }

        let model = voting_window::ActiveModel {
            event_id: Set(event_id.to_string()),
            starts_at: Set(starts_at),
            ends_at: Set(ends_at),
            is_active: Set(true),
            total_complete_voters: Set(0),
            presentation_winner_id: Set(None),
            twist_winner_id: Set(None),
            resolved_at: Set(None),
            created_at: Set(now),
        };

        match self.window_repo.create(self.window_repo.connection(), model).await {
            Ok(window) => {
                info!(event_id = %event_id, ends_at = %ends_at, "Opened voting window");
                Ok(window)
            }
            Err(e) => {
                // A concurrent open may have inserted the row first.
                if let Some(existing) = self.window_repo.find(event_id).await? {
                    return Ok(existing);
                }
                Err(e)
            }
        }
    }

    /// Stop accepting ballots now. Closing an already closed window is a no-op.
    pub async fn close(&self, event_id: &str) -> AppResult<voting_window::Model> {
        let txn = self.window_repo.begin().await?;
        let window = self
            .window_repo
            .find_for_update(&txn, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Voting window not found: {event_id}")))?;

        let now = Utc::now();
        if window.has_closed_at(now) {
            txn.commit().await?;
            return Ok(window);
        }

        let mut active: voting_window::ActiveModel = window.into();
        active.ends_at = Set(now);
        let window = self.window_repo.update(&txn, active).await?;
        txn.commit().await?;

        info!(event_id = %event_id, "Closed voting window");
        Ok(window)
    }

    /// The event's window, if opened.
    pub async fn window(&self, event_id: &str) -> AppResult<Option<voting_window::Model>> {
        self.window_repo.find(event_id).await
    }

    /// Whether ballots are accepted right now.
    pub async fn is_open(&self, event_id: &str) -> AppResult<bool> {
        Ok(self
            .window_repo
            .find(event_id)
            .await?
            .is_some_and(|w| w.is_open_at(Utc::now())))
    }

    /// Window state together with the voter's ballot.
    pub async fn status(&self, event_id: &str, voter_id: &str) -> AppResult<VotingSnapshot> {
        let window = self.window_repo.find(event_id).await?;
        let is_open = window.as_ref().is_some_and(|w| w.is_open_at(Utc::now()));
        let ballot = self.votes.ballot(event_id, voter_id).await?;

        Ok(VotingSnapshot {
            window,
            is_open,
            ballot,
        })
    }

    /// Vote counts of both categories.
    pub async fn tallies(
        &self,
        event_id: &str,
    ) -> AppResult<BTreeMap<ActivityCategory, BTreeMap<String, i64>>> {
        let conn = self.window_repo.connection();
        let mut tallies = BTreeMap::new();
        for category in ActivityCategory::ALL {
            tallies.insert(category, self.votes.tally(conn, event_id, category).await?);
        }
        Ok(tallies)
    }

    /// Cast one choice in each category as a single ballot.
    ///
    /// Both votes land in one transaction holding the window lock, so the
    /// complete-voter counter moves at most once per voter.
    pub async fn record_ballot(
        &self,
        event_id: &str,
        voter_id: &str,
        presentation_option_id: &str,
        twist_option_id: &str,
    ) -> AppResult<BallotAction> {
        let txn = self.window_repo.begin().await?;
        let window = self
            .window_repo
            .find_for_update(&txn, event_id)
            .await?
            .ok_or_else(|| AppError::InvalidState("Voting has not been opened".to_string()))?;

        let first_presentation = self
            .votes
            .cast(
                &txn,
                &window,
                voter_id,
                ActivityCategory::PresentationStyle,
                presentation_option_id,
            )
            .await?;
        let first_twist = self
            .votes
            .cast(
                &txn,
                &window,
                voter_id,
                ActivityCategory::SpeedDatingTwist,
                twist_option_id,
            )
            .await?;

        // Both categories now exist; count the voter the first time that holds.
        if first_presentation || first_twist {
            self.window_repo
                .increment_complete_voters(&txn, event_id)
                .await?;
        }

        txn.commit().await?;

        let action = if first_presentation && first_twist {
            BallotAction::Created
        } else {
            BallotAction::Updated
        };
        debug!(event_id = %event_id, voter_id = %voter_id, ?action, "Recorded ballot");
        Ok(action)
    }

    /// Resolve the winners of a closed window inside `txn`.
    ///
    /// The window row stays locked until the caller commits, so at most one
    /// caller observes `newly_resolved`.
    ///
    /// # Errors
    ///
    /// `NotFound` without a window, `InvalidState` while it is still open.
    pub async fn resolve(
        &self,
        txn: &DatabaseTransaction,
        event_id: &str,
    ) -> AppResult<ResolveOutcome> {
        let window = self
            .window_repo
            .find_for_update(txn, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Voting window not found: {event_id}")))?;

        if window.is_resolved() {
            return Ok(ResolveOutcome {
                window,
                newly_resolved: false,
            });
        }

        let now = Utc::now();
        if !window.has_closed_at(now) {
            return Err(AppError::InvalidState(
                "Voting is still open".to_string(),
            ));
        }

        let mut winners = BTreeMap::new();
        for category in ActivityCategory::ALL {
            let tally = self.votes.tally(txn, event_id, category).await?;
            let options = self.catalog.options_in(txn, category).await?;
            match pick_winner(&tally, &options) {
                Some(winner) => {
                    winners.insert(category, winner);
                }
                None => info!(event_id = %event_id, category = ?category, "No votes cast"),
            }
        }

        let mut active: voting_window::ActiveModel = window.into();
        active.presentation_winner_id = Set(winners.remove(&ActivityCategory::PresentationStyle));
        active.twist_winner_id = Set(winners.remove(&ActivityCategory::SpeedDatingTwist));
        active.is_active = Set(false);
        active.resolved_at = Set(Some(now));
        let window = self.window_repo.update(txn, active).await?;

        info!(
            event_id = %event_id,
            presentation_winner = ?window.presentation_winner_id,
            twist_winner = ?window.twist_winner_id,
            "Resolved voting window"
        );

        Ok(ResolveOutcome {
            window,
            newly_resolved: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str, sort_order: i32) -> activity_option::Model {
        activity_option::Model {
            id: id.to_string(),
            category: ActivityCategory::PresentationStyle,
            variant: id.to_string(),
            label: id.to_string(),
            description: None,
            is_active: true,
            sort_order,
            created_at: Utc::now(),
        }
    }

    fn tally(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(id, n)| ((*id).to_string(), *n)).collect()
    }

    #[test]
    fn test_highest_count_wins() {
        let options = [option("a", 1), option("b", 2)];
        assert_eq!(
            pick_winner(&tally(&[("a", 3), ("b", 2)]), &options),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_tie_goes_to_lowest_sort_order() {
        let options = [option("a", 2), option("b", 1)];
        assert_eq!(
            pick_winner(&tally(&[("a", 2), ("b", 2)]), &options),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_no_votes_no_winner() {
        let options = [option("a", 1)];
        assert_eq!(pick_winner(&BTreeMap::new(), &options), None);
    }

    #[test]
    fn test_unknown_option_loses_ties() {
        let options = [option("b", 5)];
        assert_eq!(
            pick_winner(&tally(&[("a", 1), ("b", 1)]), &options),
            Some("b".to_string())
        );
    }
}
