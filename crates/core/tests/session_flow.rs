//! End-to-end session tests against an in-memory `SQLite` database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use mixer_common::{AppError, config::PresentationConfig};
use mixer_core::{
    ActivityCatalogService, AdvanceOutcome, BallotAction, BallotInput, CurrentPresentation,
    OrderingStrategy, PresentationQueueService, RatingLedgerService, RosterMember,
    SessionController, VoteLedger, VotingSessionService,
};
use mixer_db::entities::{
    ActivityCategory, ActivityOption, AttendeeStatus, PresentationState, Rating, Vote,
    activity_option,
};
use mixer_db::repositories::{
    ActivityOptionRepository, PresentationRepository, RatingRepository, VoteRepository,
    VotingWindowRepository,
};
use mixer_db::test_utils::{TestDatabase, display_name_for};
use sea_orm::{ConnectionTrait, EntityTrait, Set};

const EVENT: &str = "ev1";
const COACH: &str = "coach";

struct Harness {
    db: TestDatabase,
    controller: SessionController,
}

async fn harness(roster: &[&str]) -> Harness {
    let db = TestDatabase::sqlite_memory()
        .await
        .expect("Failed to create test database");
    db.insert_event_with_roster(EVENT, COACH, roster)
        .await
        .unwrap();

    let options = ActivityOptionRepository::new(db.connection());
    for (id, category, sort_order, is_active) in [
        ("style_a", ActivityCategory::PresentationStyle, 1, true),
        ("style_b", ActivityCategory::PresentationStyle, 2, true),
        ("style_old", ActivityCategory::PresentationStyle, 3, false),
        ("twist_x", ActivityCategory::SpeedDatingTwist, 1, true),
        ("twist_y", ActivityCategory::SpeedDatingTwist, 2, true),
    ] {
        options
            .create(activity_option::ActiveModel {
                id: Set(id.to_string()),
                category: Set(category),
                variant: Set(id.to_string()),
                label: Set(id.to_uppercase()),
                description: Set(None),
                is_active: Set(is_active),
                sort_order: Set(sort_order),
                created_at: Set(Utc::now()),
            })
            .await
            .unwrap();
    }

    let controller = SessionController::from_database(db.connection(), &PresentationConfig::default());
    Harness { db, controller }
}

fn ballot(style: &str, twist: &str) -> BallotInput {
    BallotInput {
        presentation_option_id: Some(style.to_string()),
        twist_option_id: Some(twist.to_string()),
    }
}

async fn open_voting(h: &Harness) {
    h.controller
        .open_voting(EVENT, COACH, None, Utc::now() + Duration::minutes(10))
        .await
        .unwrap();
}

/// Open, close and resolve with no votes, leaving a seeded queue.
async fn seeded(roster: &[&str]) -> Harness {
    let h = harness(roster).await;
    open_voting(&h).await;
    h.controller.close_voting(EVENT, COACH).await.unwrap();
    let resolution = h.controller.resolve_voting(EVENT, COACH).await.unwrap();
    assert!(resolution.queue_seeded);
    h
}

async fn presenting_count(h: &Harness) -> usize {
    mixer_db::entities::PresentationEntry::find()
        .all(h.db.conn.as_ref())
        .await
        .unwrap()
        .iter()
        .filter(|e| e.state == PresentationState::Presenting)
        .count()
}

fn queue_service(h: &Harness) -> PresentationQueueService {
    PresentationQueueService::new(PresentationRepository::new(h.db.connection()))
}

fn voting_service(h: &Harness) -> VotingSessionService {
    let catalog = ActivityCatalogService::new(ActivityOptionRepository::new(h.db.connection()));
    VotingSessionService::new(
        VotingWindowRepository::new(h.db.connection()),
        VoteLedger::new(VoteRepository::new(h.db.connection()), catalog.clone()),
        catalog,
    )
}

fn presenter_of(outcome: &AdvanceOutcome) -> Option<&str> {
    match outcome {
        AdvanceOutcome::Presenting { entry, .. } => Some(entry.presenter_id.as_str()),
        _ => None,
    }
}

// === Voting ===

#[tokio::test]
async fn test_repeated_ballot_counts_voter_once() {
    let h = harness(&["u1", "u2"]).await;
    open_voting(&h).await;

    let first = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("style_a", "twist_x"))
        .await
        .unwrap();
    let second = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("style_a", "twist_x"))
        .await
        .unwrap();
    assert_eq!(first, BallotAction::Created);
    assert_eq!(second, BallotAction::Updated);

    let votes = Vote::find().all(h.db.conn.as_ref()).await.unwrap();
    assert_eq!(votes.len(), 2);

    let window = VotingWindowRepository::new(h.db.connection())
        .find(EVENT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(window.total_complete_voters, 1);

    let status = h.controller.voting_status(EVENT, "u1").await.unwrap();
    assert!(status.is_open);
    assert!(status.has_voted_both);
    assert!(status.tallies.is_none());
}

#[tokio::test]
async fn test_change_of_mind_overwrites_vote() {
    let h = harness(&["u1"]).await;
    open_voting(&h).await;

    h.controller
        .submit_ballot(EVENT, "u1", ballot("style_a", "twist_x"))
        .await
        .unwrap();
    h.controller
        .submit_ballot(EVENT, "u1", ballot("style_b", "twist_x"))
        .await
        .unwrap();

    let votes = Vote::find().all(h.db.conn.as_ref()).await.unwrap();
    let style = votes
        .iter()
        .find(|v| v.category == ActivityCategory::PresentationStyle)
        .unwrap();
    assert_eq!(style.option_id, "style_b");
}

#[tokio::test]
async fn test_winner_resolution() {
    let voters = ["u1", "u2", "u3", "u4", "u5"];
    let h = harness(&voters).await;
    open_voting(&h).await;

    for (voter, style) in voters
        .iter()
        .zip(["style_a", "style_a", "style_a", "style_b", "style_b"])
    {
        h.controller
            .submit_ballot(EVENT, voter, ballot(style, "twist_x"))
            .await
            .unwrap();
    }

    h.controller.close_voting(EVENT, COACH).await.unwrap();
    let resolution = h.controller.resolve_voting(EVENT, COACH).await.unwrap();

    assert!(resolution.newly_resolved);
    assert_eq!(resolution.window.total_complete_voters, 5);
    let winners = resolution.window.winner_by_category();
    assert_eq!(
        winners.get(&ActivityCategory::PresentationStyle).map(String::as_str),
        Some("style_a")
    );
    assert_eq!(
        winners.get(&ActivityCategory::SpeedDatingTwist).map(String::as_str),
        Some("twist_x")
    );

    let again = h.controller.resolve_voting(EVENT, COACH).await.unwrap();
    assert!(!again.newly_resolved);
    assert!(!again.queue_seeded);
    assert_eq!(again.window.resolved_at, resolution.window.resolved_at);

    let results = h.controller.voting_results(EVENT, "u1").await.unwrap();
    let tallies = results.tallies.unwrap();
    assert_eq!(
        tallies[&ActivityCategory::PresentationStyle].get("style_a"),
        Some(&3)
    );
    assert_eq!(
        tallies[&ActivityCategory::SpeedDatingTwist].get("twist_x"),
        Some(&5)
    );
}

#[tokio::test]
async fn test_tied_vote_goes_to_lowest_sort_order() {
    let h = harness(&["u1", "u2"]).await;
    open_voting(&h).await;

    h.controller
        .submit_ballot(EVENT, "u1", ballot("style_b", "twist_y"))
        .await
        .unwrap();
    h.controller
        .submit_ballot(EVENT, "u2", ballot("style_a", "twist_x"))
        .await
        .unwrap();
    h.controller.close_voting(EVENT, COACH).await.unwrap();

    let resolution = h.controller.resolve_voting(EVENT, COACH).await.unwrap();
    assert_eq!(
        resolution.window.presentation_winner_id.as_deref(),
        Some("style_a")
    );
    assert_eq!(resolution.window.twist_winner_id.as_deref(), Some("twist_x"));
}

#[tokio::test]
async fn test_results_resolve_lazily_after_close() {
    let h = harness(&["u1", "u2"]).await;
    open_voting(&h).await;
    h.controller
        .submit_ballot(EVENT, "u1", ballot("style_b", "twist_y"))
        .await
        .unwrap();
    h.controller.close_voting(EVENT, COACH).await.unwrap();

    let results = h.controller.voting_results(EVENT, "u2").await.unwrap();
    assert!(!results.is_open);
    assert!(!results.has_voted_both);
    let winners = results.winners.unwrap();
    assert_eq!(
        winners.get(&ActivityCategory::PresentationStyle).map(String::as_str),
        Some("style_b")
    );

    // Resolution seeded the queue.
    let outcome = h.controller.advance(EVENT, COACH, None).await.unwrap();
    assert_eq!(presenter_of(&outcome.outcome), Some("u1"));
}

#[tokio::test]
async fn test_category_without_votes_has_no_winner() {
    let h = harness(&["u1"]).await;
    open_voting(&h).await;
    h.controller.close_voting(EVENT, COACH).await.unwrap();

    let resolution = h.controller.resolve_voting(EVENT, COACH).await.unwrap();
    assert!(resolution.window.winner_by_category().is_empty());
    assert_eq!(resolution.window.total_complete_voters, 0);
}

#[tokio::test]
async fn test_ballot_rejections() {
    let h = harness(&["u1"]).await;

    let before_open = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("style_a", "twist_x"))
        .await;
    assert!(matches!(before_open, Err(AppError::InvalidState(_))));

    open_voting(&h).await;

    let missing = h
        .controller
        .submit_ballot(
            EVENT,
            "u1",
            BallotInput {
                presentation_option_id: Some("style_a".to_string()),
                twist_option_id: None,
            },
        )
        .await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    let wrong_category = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("twist_y", "twist_x"))
        .await;
    assert!(matches!(wrong_category, Err(AppError::Validation(_))));

    let inactive = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("style_old", "twist_x"))
        .await;
    assert!(matches!(inactive, Err(AppError::Validation(_))));

    let unknown = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("style_zzz", "twist_x"))
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let bad_twist = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("style_a", "style_b"))
        .await;
    assert!(matches!(bad_twist, Err(AppError::Validation(_))));

    // A rejected twist must not leave the style vote behind.
    assert!(Vote::find().all(h.db.conn.as_ref()).await.unwrap().is_empty());

    h.controller.close_voting(EVENT, COACH).await.unwrap();
    let after_close = h
        .controller
        .submit_ballot(EVENT, "u1", ballot("style_a", "twist_x"))
        .await;
    assert!(matches!(after_close, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_resolve_before_close_is_rejected() {
    let h = harness(&["u1"]).await;

    let unopened = h.controller.resolve_voting(EVENT, COACH).await;
    assert!(matches!(unopened, Err(AppError::NotFound(_))));

    open_voting(&h).await;
    let early = h.controller.resolve_voting(EVENT, COACH).await;
    assert!(matches!(early, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_open_is_idempotent() {
    let h = harness(&["u1"]).await;
    let ends_at = Utc::now() + Duration::minutes(10);

    let first = h
        .controller
        .open_voting(EVENT, COACH, None, ends_at)
        .await
        .unwrap();
    let second = h
        .controller
        .open_voting(EVENT, COACH, None, ends_at + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(first, second);

    let backwards = h
        .controller
        .open_voting("ev1", COACH, Some(ends_at), ends_at - Duration::minutes(1))
        .await;
    assert!(matches!(backwards, Err(AppError::Validation(_))));
}

// === Capabilities ===

#[tokio::test]
async fn test_capability_checks() {
    let h = harness(&["u1"]).await;
    h.db
        .insert_attendees(EVENT, &[("pending", AttendeeStatus::Pending)])
        .await
        .unwrap();

    let pending = h.controller.voting_status(EVENT, "pending").await;
    assert!(matches!(pending, Err(AppError::Forbidden(_))));

    let stranger = h.controller.poll_current(EVENT, "stranger").await;
    assert!(matches!(stranger, Err(AppError::Forbidden(_))));

    let not_coach = h.controller.advance(EVENT, "u1", None).await;
    assert!(matches!(not_coach, Err(AppError::Forbidden(_))));

    let no_event = h.controller.voting_status("missing", "u1").await;
    assert!(matches!(no_event, Err(AppError::EventNotFound(_))));
}

// === Presentation queue ===

#[tokio::test]
async fn test_advance_unseeded_queue() {
    let h = harness(&["u1"]).await;
    let result = h.controller.advance(EVENT, COACH, None).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_queue_progression() {
    let h = seeded(&["u1", "u2", "u3"]).await;

    for (expected, version) in [("u1", 1), ("u2", 2), ("u3", 3)] {
        let result = h.controller.advance(EVENT, COACH, None).await.unwrap();
        match result.outcome {
            AdvanceOutcome::Presenting { entry, version: v } => {
                assert_eq!(entry.presenter_id, expected);
                assert_eq!(v, version);
                assert_eq!(result.presenter_name, Some(display_name_for(expected)));
            }
            other => panic!("expected {expected} presenting, got {other:?}"),
        }
        assert_eq!(presenting_count(&h).await, 1);
    }

    for _ in 0..2 {
        let result = h.controller.advance(EVENT, COACH, None).await.unwrap();
        assert_eq!(
            result.outcome,
            AdvanceOutcome::AllCompleted {
                completed_count: 3,
                total_count: 3,
                version: 4,
            }
        );
        assert!(result.presenter_name.is_none());
        assert_eq!(presenting_count(&h).await, 0);
    }

    let poll = h.controller.poll_current(EVENT, "u1").await.unwrap();
    assert_eq!(
        poll,
        CurrentPresentation::Idle {
            all_completed: true,
            completed_count: 3,
            total_count: 3,
        }
    );
}

#[tokio::test]
async fn test_concurrent_advance_makes_one_transition() {
    let h = seeded(&["u1", "u2", "u3"]).await;

    let a = h.controller.clone();
    let b = h.controller.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { a.advance(EVENT, COACH, Some(0)).await }),
        tokio::spawn(async move { b.advance(EVENT, COACH, Some(0)).await }),
    );
    let outcomes = [first.unwrap().unwrap(), second.unwrap().unwrap()];

    let advanced = outcomes
        .iter()
        .filter(|r| matches!(r.outcome, AdvanceOutcome::Presenting { .. }))
        .count();
    let superseded = outcomes
        .iter()
        .filter(|r| matches!(r.outcome, AdvanceOutcome::Superseded { .. }))
        .count();
    assert_eq!(advanced, 1);
    assert_eq!(superseded, 1);

    for result in &outcomes {
        if let AdvanceOutcome::Superseded { current, version } = &result.outcome {
            assert_eq!(*version, 1);
            assert_eq!(current.as_ref().map(|e| e.presenter_id.as_str()), Some("u1"));
        }
    }
    assert_eq!(presenting_count(&h).await, 1);
}

#[tokio::test]
async fn test_concurrent_advance_stress() {
    let h = seeded(&["u1", "u2", "u3", "u4"]).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.advance(EVENT, COACH, Some(0)).await })
        })
        .collect();
    let results = futures::future::join_all(handles).await;

    let advanced = results
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .filter(|r| matches!(r.outcome, AdvanceOutcome::Presenting { .. }))
        .count();
    assert_eq!(advanced, 1);
    assert_eq!(presenting_count(&h).await, 1);
}

#[tokio::test]
async fn test_double_advance_without_version_makes_one_transition() {
    let h = seeded(&["u1", "u2", "u3"]).await;

    let a = h.controller.clone();
    let b = h.controller.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { a.advance(EVENT, COACH, None).await }),
        tokio::spawn(async move { b.advance(EVENT, COACH, None).await }),
    );
    let outcomes = [first.unwrap().unwrap(), second.unwrap().unwrap()];

    let presenters: Vec<_> = outcomes
        .iter()
        .filter_map(|r| presenter_of(&r.outcome))
        .collect();
    assert_eq!(presenters, ["u1"]);
    assert!(outcomes.iter().any(|r| matches!(
        r.outcome,
        AdvanceOutcome::Superseded { version: 1, .. }
    )));
    assert_eq!(presenting_count(&h).await, 1);

    let progress = queue_service(&h).progress(EVENT).await.unwrap().unwrap();
    assert_eq!(progress.version, 1);
    assert_eq!(progress.completed_count, 0);

    let next = h.controller.advance(EVENT, COACH, None).await.unwrap();
    assert_eq!(presenter_of(&next.outcome), Some("u2"));
}

#[tokio::test]
async fn test_next_previews_lowest_waiting_entry() {
    let h = seeded(&["u1", "u2", "u3"]).await;
    let queue = queue_service(&h);

    for _ in 0..2 {
        let next = queue.next(EVENT).await.unwrap().unwrap();
        assert_eq!(next.presenter_id, "u1");
        assert_eq!(next.state, PresentationState::Waiting);
    }
    assert_eq!(presenting_count(&h).await, 0);
    assert_eq!(queue.progress(EVENT).await.unwrap().unwrap().version, 0);

    h.controller.advance(EVENT, COACH, None).await.unwrap();
    assert_eq!(queue.next(EVENT).await.unwrap().unwrap().presenter_id, "u2");
    let overview = h.controller.queue_overview(EVENT, COACH).await.unwrap();
    assert_eq!(overview.up_next.as_deref(), Some("u2"));

    h.controller.advance(EVENT, COACH, None).await.unwrap();
    h.controller.advance(EVENT, COACH, None).await.unwrap();
    assert!(queue.next(EVENT).await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_seed_leaves_queue_unchanged() {
    let h = seeded(&["u1", "u2"]).await;
    let queue = queue_service(&h);

    let reseeded = queue
        .seed(
            h.db.conn.as_ref(),
            EVENT,
            &["u9".to_string(), "u8".to_string(), "u7".to_string()],
        )
        .await
        .unwrap();
    assert!(!reseeded);

    let entries: Vec<_> = queue
        .entries(EVENT)
        .await
        .unwrap()
        .into_iter()
        .map(|e| (e.position, e.presenter_id))
        .collect();
    assert_eq!(
        entries,
        [(1, "u1".to_string()), (2, "u2".to_string())]
    );
    assert_eq!(queue.progress(EVENT).await.unwrap().unwrap().total_count, 2);
}

struct ReverseOrder;

impl OrderingStrategy for ReverseOrder {
    fn order(&self, roster: &[RosterMember]) -> Vec<String> {
        roster.iter().rev().map(|m| m.user_id.clone()).collect()
    }
}

#[tokio::test]
async fn test_ordering_strategy_is_injectable() {
    let mut h = harness(&["u1", "u2", "u3"]).await;
    h.controller = h.controller.clone().with_ordering(Arc::new(ReverseOrder));
    open_voting(&h).await;
    h.controller.close_voting(EVENT, COACH).await.unwrap();
    h.controller.resolve_voting(EVENT, COACH).await.unwrap();

    let overview = h.controller.queue_overview(EVENT, COACH).await.unwrap();
    let order: Vec<_> = overview
        .slots
        .iter()
        .map(|s| (s.entry.position, s.entry.presenter_id.as_str()))
        .collect();
    assert_eq!(order, [(1, "u3"), (2, "u2"), (3, "u1")]);
    assert_eq!(overview.progress.unwrap().total_count, 3);
}

// === Ratings ===

#[tokio::test]
async fn test_rating_flow() {
    let h = seeded(&["u1", "u2", "u3"]).await;

    let early = h.controller.rate(EVENT, "u1", "u2", 4).await;
    assert!(matches!(early, Err(AppError::InvalidState(_))));

    h.controller.advance(EVENT, COACH, None).await.unwrap();

    h.controller.rate(EVENT, "u1", "u2", 4).await.unwrap();
    assert_eq!(h.controller.rate(EVENT, "u1", "u2", 5).await.unwrap(), 5);

    let ratings = Rating::find().all(h.db.conn.as_ref()).await.unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].value, 5);

    let own = h.controller.rate(EVENT, "u1", "u1", 5).await;
    assert!(matches!(own, Err(AppError::Validation(_))));

    let out_of_range = h.controller.rate(EVENT, "u1", "u3", 6).await;
    assert!(matches!(out_of_range, Err(AppError::Validation(_))));

    let unknown = h.controller.rate(EVENT, "ghost", "u3", 3).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let waiting = h.controller.rate(EVENT, "u2", "u3", 3).await;
    assert!(matches!(waiting, Err(AppError::InvalidState(_))));

    match h.controller.poll_current(EVENT, "u2").await.unwrap() {
        CurrentPresentation::Presenting {
            entry,
            presenter_name,
            time_remaining,
            user_has_rated,
        } => {
            assert_eq!(entry.presenter_id, "u1");
            assert_eq!(entry.position, 1);
            assert_eq!(presenter_name, display_name_for("u1"));
            assert!((0..=90).contains(&time_remaining));
            assert!(user_has_rated);
        }
        other => panic!("expected a presenter, got {other:?}"),
    }

    match h.controller.poll_current(EVENT, "u3").await.unwrap() {
        CurrentPresentation::Presenting { user_has_rated, .. } => assert!(!user_has_rated),
        other => panic!("expected a presenter, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rankings_and_my_scores() {
    let h = seeded(&["u1", "u2", "u3"]).await;

    // u1: 4 and 4, u2: 5 and 3, u3: 5 and 5.
    let plan: [(&str, [(&str, i32); 2]); 3] = [
        ("u1", [("u2", 4), ("u3", 4)]),
        ("u2", [("u1", 5), ("u3", 3)]),
        ("u3", [("u1", 5), ("u2", 5)]),
    ];
    for (presenter, ratings) in plan {
        h.controller.advance(EVENT, COACH, None).await.unwrap();
        for (rater, value) in ratings {
            h.controller.rate(EVENT, presenter, rater, value).await.unwrap();
        }
    }

    for _ in 0..3 {
        let rankings = h.controller.rankings(EVENT, COACH).await.unwrap();
        let order: Vec<_> = rankings
            .iter()
            .map(|r| (r.rank, r.score.presenter_id.as_str()))
            .collect();
        assert_eq!(order, [(1, "u3"), (2, "u1"), (3, "u2")]);
    }

    let mine = h.controller.my_scores(EVENT, "u2").await.unwrap();
    assert_eq!(mine.rating_count, 2);
    assert_eq!(mine.rank, Some(3));
    assert_eq!(mine.total_participants, 3);
    assert_eq!(mine.distribution, [0, 0, 1, 0, 1]);
    assert!((mine.average_score.unwrap() - 4.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_my_scores_unrated() {
    let h = seeded(&["u1", "u2"]).await;

    let mine = h.controller.my_scores(EVENT, "u1").await.unwrap();
    assert_eq!(mine.rating_count, 0);
    assert!(mine.rank.is_none());
    assert!(mine.average_score.is_none());
    assert_eq!(mine.total_participants, 2);
    assert_eq!(mine.distribution, [0; 5]);
}

#[tokio::test]
async fn test_average_for_presenter() {
    let h = seeded(&["u1", "u2", "u3"]).await;
    h.controller.advance(EVENT, COACH, None).await.unwrap();
    h.controller.rate(EVENT, "u1", "u2", 4).await.unwrap();
    h.controller.rate(EVENT, "u1", "u3", 5).await.unwrap();

    let ratings = RatingLedgerService::new(RatingRepository::new(h.db.connection()));
    let score = ratings.average_for(EVENT, "u1").await.unwrap();
    assert_eq!(score.presenter_id, "u1");
    assert_eq!(score.total, 9);
    assert_eq!(score.count, 2);
    assert!((score.average() - 4.5).abs() < f64::EPSILON);

    let unrated = ratings.average_for(EVENT, "u2").await.unwrap();
    assert_eq!(unrated.count, 0);
    assert_eq!(unrated.total, 0);
}

// === Voting window ===

#[tokio::test]
async fn test_is_open_follows_window_and_resolution() {
    let h = harness(&["u1"]).await;
    let voting = voting_service(&h);
    assert!(!voting.is_open(EVENT).await.unwrap());

    open_voting(&h).await;
    assert!(voting.is_open(EVENT).await.unwrap());

    h.controller.close_voting(EVENT, COACH).await.unwrap();
    assert!(!voting.is_open(EVENT).await.unwrap());

    h.controller.resolve_voting(EVENT, COACH).await.unwrap();
    assert!(!voting.is_open(EVENT).await.unwrap());

    h.db.insert_event_with_roster("ev2", COACH, &["u1"])
        .await
        .unwrap();
    let now = Utc::now();
    voting
        .open("ev2", Some(now - Duration::minutes(2)), now - Duration::minutes(1))
        .await
        .unwrap();
    assert!(!voting.is_open("ev2").await.unwrap());
}

// === Catalog ===

#[tokio::test]
async fn test_catalog_get() {
    let h = harness(&["u1"]).await;

    let option = h.controller.catalog().get("style_a").await.unwrap();
    assert_eq!(option.label, "STYLE_A");
    assert_eq!(option.category, ActivityCategory::PresentationStyle);

    let missing = h.controller.catalog().get("missing").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_failed_install_leaves_catalog_empty() {
    let db = TestDatabase::sqlite_memory().await.unwrap();
    let controller = SessionController::from_database(db.connection(), &PresentationConfig::default());

    db.conn
        .execute_unprepared(
            "CREATE TRIGGER reject_role_swap BEFORE INSERT ON activity_option \
             WHEN NEW.variant = 'role_swap' \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .await
        .unwrap();
    assert!(controller.catalog().install_defaults().await.is_err());
    assert!(ActivityOption::find().all(db.conn.as_ref()).await.unwrap().is_empty());

    db.conn
        .execute_unprepared("DROP TRIGGER reject_role_swap;")
        .await
        .unwrap();
    assert_eq!(controller.catalog().install_defaults().await.unwrap(), 6);
}

#[tokio::test]
async fn test_install_defaults_once() {
    let db = TestDatabase::sqlite_memory().await.unwrap();
    db.insert_event_with_roster(EVENT, COACH, &["u1"]).await.unwrap();
    let controller = SessionController::from_database(db.connection(), &PresentationConfig::default());

    assert_eq!(controller.catalog().install_defaults().await.unwrap(), 6);
    assert_eq!(controller.catalog().install_defaults().await.unwrap(), 0);

    let menu = controller.list_activities(EVENT, "u1").await.unwrap();
    let styles: Vec<_> = menu
        .presentation_styles
        .iter()
        .map(|o| o.variant.as_str())
        .collect();
    assert_eq!(styles, ["elevator_pitch", "two_truths_one_lie", "show_and_tell"]);
    assert_eq!(menu.twists.len(), 3);

    let retired = controller
        .catalog()
        .deactivate(&menu.twists[0].id)
        .await
        .unwrap();
    assert!(!retired.is_active);
    let menu = controller.list_activities(EVENT, "u1").await.unwrap();
    assert_eq!(menu.twists.len(), 2);
}
