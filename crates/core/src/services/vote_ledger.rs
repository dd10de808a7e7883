//! Vote ledger: one vote per (event, voter, category).

use std::collections::BTreeMap;

use chrono::Utc;
use mixer_common::{AppError, AppResult, IdGenerator};
use mixer_db::{
    entities::{ActivityCategory, vote, voting_window},
    repositories::VoteRepository,
};
use sea_orm::{ConnectionTrait, Set};

use super::activity_catalog::ActivityCatalogService;

/// A voter's current choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ballot {
    pub presentation_option_id: Option<String>,
    pub twist_option_id: Option<String>,
}

impl Ballot {
    /// Whether both categories have been cast.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.presentation_option_id.is_some() && self.twist_option_id.is_some()
    }
}

/// Vote ledger service.
#[derive(Clone)]
pub struct VoteLedger {
    vote_repo: VoteRepository,
    catalog: ActivityCatalogService,
    id_gen: IdGenerator,
}

impl VoteLedger {
    /// Create a new vote ledger.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository, catalog: ActivityCatalogService) -> Self {
        Self {
            vote_repo,
            catalog,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record or replace a voter's choice in one category.
    ///
    /// `window` must be the event's window as read under the caller's lock.
    /// Returns `true` when this is the voter's first vote in the category.
    pub async fn cast<C: ConnectionTrait>(
        &self,
        conn: &C,
        window: &voting_window::Model,
        voter_id: &str,
        category: ActivityCategory,
        option_id: &str,
    ) -> AppResult<bool> {
        let now = Utc::now();
        if !window.is_open_at(now) {
            return Err(AppError::InvalidState("Voting is not open".to_string()));
        }

        self.catalog.validate_choice(conn, option_id, category).await?;

        let existing = self
            .vote_repo
            .find(conn, &window.event_id, voter_id, category)
            .await?;

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(window.event_id.clone()),
            voter_id: Set(voter_id.to_string()),
            category: Set(category),
            option_id: Set(option_id.to_string()),
            cast_at: Set(now),
        };
        self.vote_repo.upsert(conn, model).await?;

        Ok(existing.is_none())
    }

    /// Vote counts per option for one category.
    pub async fn tally<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
        category: ActivityCategory,
    ) -> AppResult<BTreeMap<String, i64>> {
        let rows = self.vote_repo.tally(conn, event_id, category).await?;
        Ok(rows.into_iter().collect())
    }

    /// The voter's current choices.
    pub async fn ballot(&self, event_id: &str, voter_id: &str) -> AppResult<Ballot> {
        let votes = self.vote_repo.find_by_voter(event_id, voter_id).await?;

        let mut ballot = Ballot::default();
        for vote in votes {
            match vote.category {
                ActivityCategory::PresentationStyle => {
                    ballot.presentation_option_id = Some(vote.option_id);
                }
                ActivityCategory::SpeedDatingTwist => {
                    ballot.twist_option_id = Some(vote.option_id);
                }
            }
        }
        Ok(ballot)
    }
}
