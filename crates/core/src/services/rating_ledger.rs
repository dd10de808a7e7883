//! Rating ledger: one 1..=5 score per (event, presenter, rater).

use std::cmp::Ordering;

use chrono::Utc;
use mixer_common::{AppError, AppResult, IdGenerator};
use mixer_db::{entities::rating, repositories::RatingRepository};
use sea_orm::Set;
use tracing::debug;

/// Lowest accepted score.
pub const MIN_RATING: i32 = 1;
/// Highest accepted score.
pub const MAX_RATING: i32 = 5;

/// Aggregate of the ratings one presenter received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenterScore {
    pub presenter_id: String,
    pub total: i64,
    pub count: i64,
}

impl PresenterScore {
    /// Mean score, `0.0` without ratings.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }

    /// Aggregate a `[count of 1s, .., count of 5s]` distribution.
    #[must_use]
    pub fn from_distribution(presenter_id: &str, distribution: &[i64; 5]) -> Self {
        let (total, count) = distribution
            .iter()
            .zip(i64::from(MIN_RATING)..)
            .fold((0, 0), |(total, count), (n, value)| {
                (total + n * value, count + n)
            });
        Self {
            presenter_id: presenter_id.to_string(),
            total,
            count,
        }
    }

    /// Compare averages exactly, without going through floats.
    fn cmp_average(&self, other: &Self) -> Ordering {
        (i128::from(self.total) * i128::from(other.count))
            .cmp(&(i128::from(other.total) * i128::from(self.count)))
    }
}

/// Reject out-of-range values and self-ratings.
pub fn validate_rating(presenter_id: &str, rater_id: &str, value: i32) -> AppResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(AppError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    if presenter_id == rater_id {
        return Err(AppError::Validation(
            "You cannot rate yourself".to_string(),
        ));
    }
    Ok(())
}

/// Order by average descending, then presenter id ascending.
pub fn rank_scores(scores: &mut [PresenterScore]) {
    scores.sort_by(|a, b| {
        b.cmp_average(a)
            .then_with(|| a.presenter_id.cmp(&b.presenter_id))
    });
}

/// Rating ledger service.
#[derive(Clone)]
pub struct RatingLedgerService {
    rating_repo: RatingRepository,
    id_gen: IdGenerator,
}

impl RatingLedgerService {
    /// Create a new rating ledger.
    #[must_use]
    pub const fn new(rating_repo: RatingRepository) -> Self {
        Self {
            rating_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record or overwrite the rater's score for a presenter.
    pub async fn rate(
        &self,
        event_id: &str,
        presenter_id: &str,
        rater_id: &str,
        value: i32,
    ) -> AppResult<()> {
        validate_rating(presenter_id, rater_id, value)?;

        let model = rating::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event_id.to_string()),
            presenter_id: Set(presenter_id.to_string()),
            rater_id: Set(rater_id.to_string()),
            value: Set(value),
            rated_at: Set(Utc::now()),
        };
        self.rating_repo.upsert(model).await?;

        debug!(event_id = %event_id, presenter_id = %presenter_id, rater_id = %rater_id, value, "Recorded rating");
        Ok(())
    }

    /// Whether the rater has scored this presenter.
    pub async fn has_rated(
        &self,
        event_id: &str,
        presenter_id: &str,
        rater_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .rating_repo
            .find(event_id, presenter_id, rater_id)
            .await?
            .is_some())
    }

    /// Number of ratings per value, index 0 holding the count of 1s.
    pub async fn distribution(&self, event_id: &str, presenter_id: &str) -> AppResult<[i64; 5]> {
        let mut counts = [0_i64; 5];
        for (value, count) in self.rating_repo.value_counts(event_id, presenter_id).await? {
            if let Some(slot) = usize::try_from(value - MIN_RATING)
                .ok()
                .and_then(|i| counts.get_mut(i))
            {
                *slot = count;
            }
        }
        Ok(counts)
    }

    /// Sum and count of a presenter's ratings.
    pub async fn average_for(&self, event_id: &str, presenter_id: &str) -> AppResult<PresenterScore> {
        let distribution = self.distribution(event_id, presenter_id).await?;
        Ok(PresenterScore::from_distribution(presenter_id, &distribution))
    }

    /// Every rated presenter, best first.
    pub async fn rankings(&self, event_id: &str) -> AppResult<Vec<PresenterScore>> {
        let mut scores: Vec<PresenterScore> = self
            .rating_repo
            .presenter_totals(event_id)
            .await?
            .into_iter()
            .map(|(presenter_id, total, count)| PresenterScore {
                presenter_id,
                total,
                count,
            })
            .collect();
        rank_scores(&mut scores);
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(id: &str, total: i64, count: i64) -> PresenterScore {
        PresenterScore {
            presenter_id: id.to_string(),
            total,
            count,
        }
    }

    #[test]
    fn test_value_bounds() {
        assert!(validate_rating("u1", "u2", 1).is_ok());
        assert!(validate_rating("u1", "u2", 5).is_ok());
        assert!(matches!(
            validate_rating("u1", "u2", 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_rating("u1", "u2", 6),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_self_rating_rejected() {
        assert!(matches!(
            validate_rating("u1", "u1", 5),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_ranking_ties_break_on_presenter_id() {
        let mut scores = vec![score("u3", 8, 2), score("u1", 4, 1), score("u2", 9, 2)];
        rank_scores(&mut scores);
        let order: Vec<_> = scores.iter().map(|s| s.presenter_id.as_str()).collect();
        assert_eq!(order, ["u2", "u1", "u3"]);
    }

    #[test]
    fn test_score_from_distribution() {
        let s = PresenterScore::from_distribution("u1", &[0, 0, 1, 1, 2]);
        assert_eq!(s.count, 4);
        assert_eq!(s.total, 17);
        assert!((s.average() - 4.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_without_ratings() {
        assert!(score("u1", 0, 0).average().abs() < f64::EPSILON);
    }
}
