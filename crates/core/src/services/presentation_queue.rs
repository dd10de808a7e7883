//! Presentation queue service.
//!
//! Entries move `Waiting -> Presenting -> Completed` and at most one entry per
//! event is `Presenting`. Every advance runs in a transaction holding the
//! queue row lock and bumps the queue version with a compare-and-set, so two
//! coaches pressing "next" at the same time produce exactly one transition.

use std::collections::HashSet;

use chrono::Utc;
use mixer_common::{AppError, AppResult, IdGenerator};
use mixer_db::{
    entities::{PresentationState, presentation_entry, presentation_queue},
    repositories::PresentationRepository,
};
use sea_orm::{ConnectionTrait, Set};
use tracing::{debug, error, info};

/// Outcome of an advance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// `entry` is now presenting.
    Presenting {
        entry: presentation_entry::Model,
        version: i32,
    },
    /// Nobody is left to present.
    AllCompleted {
        completed_count: u64,
        total_count: u64,
        version: i32,
    },
    /// Another advance won the race; nothing was changed.
    Superseded {
        current: Option<presentation_entry::Model>,
        version: i32,
    },
}

/// Completed and total counts of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueProgress {
    pub completed_count: u64,
    pub total_count: u64,
    pub version: i32,
}

impl QueueProgress {
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.completed_count == self.total_count
    }
}

/// Transition computed from a consistent read of the entries.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AdvancePlan {
    /// Entry to move to `Completed`.
    pub complete: Option<presentation_entry::Model>,
    /// Entry to move to `Presenting`.
    pub start: Option<presentation_entry::Model>,
}

impl AdvancePlan {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.complete.is_none() && self.start.is_none()
    }
}

/// Compute the next transition from the event's entries.
///
/// # Errors
///
/// `Internal` when more than one entry is presenting.
pub fn plan_advance(entries: &[presentation_entry::Model]) -> AppResult<AdvancePlan> {
    let mut presenting = entries
        .iter()
        .filter(|e| e.state == PresentationState::Presenting);
    let current = presenting.next();
    if presenting.next().is_some() {
        return Err(AppError::Internal(
            "More than one entry is presenting".to_string(),
        ));
    }

    let start = entries
        .iter()
        .filter(|e| e.state == PresentationState::Waiting)
        .min_by_key(|e| e.position);

    Ok(AdvancePlan {
        complete: current.cloned(),
        start: start.cloned(),
    })
}

fn queue_not_initialized() -> AppError {
    AppError::InvalidState("Queue not initialized".to_string())
}

fn count_completed(entries: &[presentation_entry::Model]) -> u64 {
    entries
        .iter()
        .filter(|e| e.state == PresentationState::Completed)
        .count() as u64
}

/// Presentation queue service.
#[derive(Clone)]
pub struct PresentationQueueService {
    presentation_repo: PresentationRepository,
    id_gen: IdGenerator,
}

impl PresentationQueueService {
    /// Create a new presentation queue service.
    #[must_use]
    pub const fn new(presentation_repo: PresentationRepository) -> Self {
        Self {
            presentation_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create the queue with positions `1..=N` in the given order.
    ///
    /// Seeding happens once; returns `false` if the queue already exists.
    /// Duplicate presenter ids keep their first position.
    pub async fn seed<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
        presenter_ids: &[String],
    ) -> AppResult<bool> {
        if self
            .presentation_repo
            .find_queue_for_update(conn, event_id)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let mut seen = HashSet::new();
        let presenters: Vec<&String> = presenter_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .collect();

        let now = Utc::now();
        let total = i32::try_from(presenters.len())
            .map_err(|_| AppError::Validation("Roster is too large".to_string()))?;

        self.presentation_repo
            .create_queue(
                conn,
                presentation_queue::ActiveModel {
                    event_id: Set(event_id.to_string()),
                    version: Set(0),
                    total_count: Set(total),
                    seeded_at: Set(now),
                },
            )
            .await?;

        let entries = presenters
            .into_iter()
            .zip(1..)
            .map(|(presenter_id, position)| presentation_entry::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(event_id.to_string()),
                presenter_id: Set(presenter_id.clone()),
                position: Set(position),
                state: Set(PresentationState::Waiting),
                started_at: Set(None),
                completed_at: Set(None),
            })
            .collect();
        self.presentation_repo.insert_entries(conn, entries).await?;

        info!(event_id = %event_id, presenters = total, "Seeded presentation queue");
        Ok(true)
    }

    /// Complete the current presenter, if any, and start the next one.
    ///
    /// The call only proceeds if the queue is still at `expected_version`
    /// once its row is locked, and otherwise reports `Superseded`. Without
    /// one, the version observed before locking is used, so two advances
    /// issued against the same state make a single transition.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the queue has not been seeded.
    pub async fn advance(
        &self,
        event_id: &str,
        expected_version: Option<i32>,
    ) -> AppResult<AdvanceOutcome> {
        let expected_version = match expected_version {
            Some(version) => version,
            None => {
                self.presentation_repo
                    .find_queue(event_id)
                    .await?
                    .ok_or_else(queue_not_initialized)?
                    .version
            }
        };

        let txn = self.presentation_repo.begin().await?;
        let queue = self
            .presentation_repo
            .find_queue_for_update(&txn, event_id)
            .await?
            .ok_or_else(queue_not_initialized)?;

        let entries = self.presentation_repo.entries(&txn, event_id).await?;

        if expected_version != queue.version {
            txn.rollback().await?;
            debug!(event_id = %event_id, version = queue.version, expected_version, "Stale advance");
            return Ok(AdvanceOutcome::Superseded {
                current: entries
                    .into_iter()
                    .find(|e| e.state == PresentationState::Presenting),
                version: queue.version,
            });
        }

        let plan = plan_advance(&entries).inspect_err(|e| {
            error!(event_id = %event_id, error = %e, "Presentation queue invariant violated");
        })?;

        let total_count = entries.len() as u64;
        if plan.is_noop() {
            txn.rollback().await?;
            return Ok(AdvanceOutcome::AllCompleted {
                completed_count: count_completed(&entries),
                total_count,
                version: queue.version,
            });
        }

        if !self
            .presentation_repo
            .compare_and_bump_version(&txn, event_id, queue.version)
            .await?
        {
            txn.rollback().await?;
            let current = self.current(event_id).await?;
            let version = self
                .presentation_repo
                .find_queue(event_id)
                .await?
                .map_or(queue.version, |q| q.version);
            return Ok(AdvanceOutcome::Superseded { current, version });
        }
        let version = queue.version + 1;
        let now = Utc::now();

        let completed_now = plan.complete.is_some();
        if let Some(entry) = plan.complete {
            let presenter_id = entry.presenter_id.clone();
            let mut active: presentation_entry::ActiveModel = entry.into();
            active.state = Set(PresentationState::Completed);
            active.completed_at = Set(Some(now));
            self.presentation_repo.update_entry(&txn, active).await?;
            debug!(event_id = %event_id, presenter_id = %presenter_id, "Presentation completed");
        }

        let outcome = match plan.start {
            Some(entry) => {
                let mut active: presentation_entry::ActiveModel = entry.into();
                active.state = Set(PresentationState::Presenting);
                active.started_at = Set(Some(now));
                let entry = self.presentation_repo.update_entry(&txn, active).await?;
                info!(
                    event_id = %event_id,
                    presenter_id = %entry.presenter_id,
                    position = entry.position,
                    "Presentation started"
                );
                AdvanceOutcome::Presenting { entry, version }
            }
            None => {
                info!(event_id = %event_id, "All presentations completed");
                AdvanceOutcome::AllCompleted {
                    completed_count: count_completed(&entries) + u64::from(completed_now),
                    total_count,
                    version,
                }
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    /// The entry currently presenting.
    ///
    /// # Errors
    ///
    /// `Internal` when more than one entry is presenting.
    pub async fn current(&self, event_id: &str) -> AppResult<Option<presentation_entry::Model>> {
        let mut presenting = self
            .presentation_repo
            .entries_in_state(event_id, PresentationState::Presenting)
            .await?;
        if presenting.len() > 1 {
            error!(event_id = %event_id, count = presenting.len(), "Multiple presenters active");
            return Err(AppError::Internal(
                "More than one entry is presenting".to_string(),
            ));
        }
        Ok(presenting.pop())
    }

    /// The lowest waiting entry.
    pub async fn next(&self, event_id: &str) -> AppResult<Option<presentation_entry::Model>> {
        self.presentation_repo
            .first_in_state(event_id, PresentationState::Waiting)
            .await
    }

    /// Completed and total counts, or `None` before seeding.
    pub async fn progress(&self, event_id: &str) -> AppResult<Option<QueueProgress>> {
        let Some(queue) = self.presentation_repo.find_queue(event_id).await? else {
            return Ok(None);
        };
        let completed_count = self
            .presentation_repo
            .count_in_state(event_id, PresentationState::Completed)
            .await?;

        Ok(Some(QueueProgress {
            completed_count,
            total_count: u64::try_from(queue.total_count).unwrap_or_default(),
            version: queue.version,
        }))
    }

    /// All entries in queue order.
    pub async fn entries(&self, event_id: &str) -> AppResult<Vec<presentation_entry::Model>> {
        self.presentation_repo
            .entries(self.presentation_repo.connection(), event_id)
            .await
    }

    /// A presenter's entry.
    pub async fn entry(
        &self,
        event_id: &str,
        presenter_id: &str,
    ) -> AppResult<Option<presentation_entry::Model>> {
        self.presentation_repo.find_entry(event_id, presenter_id).await
    }
}
