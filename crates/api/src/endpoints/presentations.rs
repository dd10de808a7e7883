//! Attendee presentation endpoints: polling, rating, own scores.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use mixer_common::AppResult;
use mixer_core::{CurrentPresentation, MIN_RATING};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, round_score},
};

/// Current presenter response.
///
/// Either the presenter fields or the progress fields are set, depending on
/// `has_presenter`.
#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrentResponse {
    pub has_presenter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presenter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presenter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_has_rated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl From<CurrentPresentation> for CurrentResponse {
    fn from(current: CurrentPresentation) -> Self {
        match current {
            CurrentPresentation::Presenting {
                entry,
                presenter_name,
                time_remaining,
                user_has_rated,
            } => Self {
                has_presenter: true,
                presenter_id: Some(entry.presenter_id),
                presenter_name: Some(presenter_name),
                order: Some(entry.position),
                started_at: entry.started_at.map(|t| t.to_rfc3339()),
                time_remaining: Some(time_remaining),
                user_has_rated: Some(user_has_rated),
                ..Self::default()
            },
            CurrentPresentation::Idle {
                all_completed,
                completed_count,
                total_count,
            } => Self {
                has_presenter: false,
                all_completed: Some(all_completed),
                completed_count: Some(completed_count),
                total_count: Some(total_count),
                ..Self::default()
            },
        }
    }
}

/// Rate request. The range is checked after the caller's capability.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i32,
}

/// Rate response.
#[derive(Serialize)]
pub struct RateResponse {
    pub rating: i32,
}

/// The caller's own scores.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyScoresResponse {
    pub average_score: Option<f64>,
    pub rating_count: i64,
    pub rank: Option<usize>,
    pub total_participants: u64,
    /// Count per rating value, keyed `"1"` to `"5"`.
    pub distribution: BTreeMap<String, i64>,
}

/// Poll the current presenter.
async fn current(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<CurrentResponse>> {
    let current = state.session.poll_current(&event_id, &user.id).await?;
    Ok(ApiResponse::ok(current.into()))
}

/// Rate the presenter on stage.
async fn rate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((event_id, presenter_id)): Path<(String, String)>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> AppResult<ApiResponse<RateResponse>> {
    let Json(req) = payload?;

    let rating = state
        .session
        .rate(&event_id, &presenter_id, &user.id, req.rating)
        .await?;

    Ok(ApiResponse::ok(RateResponse { rating }))
}

/// The caller's own average, rank and distribution.
async fn my_scores(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<MyScoresResponse>> {
    let scores = state.session.my_scores(&event_id, &user.id).await?;

    let distribution = scores
        .distribution
        .iter()
        .zip(MIN_RATING..)
        .map(|(count, value)| (value.to_string(), *count))
        .collect();

    Ok(ApiResponse::ok(MyScoresResponse {
        average_score: scores.average_score.map(round_score),
        rating_count: scores.rating_count,
        rank: scores.rank,
        total_participants: scores.total_participants,
        distribution,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/presentations/current", get(current))
        .route("/presentations/my-scores", get(my_scores))
        .route("/presentations/{presenter_id}/rate", post(rate))
}
