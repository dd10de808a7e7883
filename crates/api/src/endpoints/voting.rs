//! Attendee voting endpoints.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use mixer_common::AppResult;
use mixer_core::{BallotAction, BallotInput, VotingView};
use mixer_db::entities::ActivityCategory;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Vote request. Both fields are required; a missing one is a validation error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub presentation_option_id: Option<String>,
    pub twist_option_id: Option<String>,
}

/// Vote response.
#[derive(Serialize)]
pub struct VoteResponse {
    pub action: BallotAction,
}

/// Voting status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStatusResponse {
    pub is_voting_open: bool,
    pub has_voted_both: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_complete_voters: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<BTreeMap<ActivityCategory, BTreeMap<String, i64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winners: Option<BTreeMap<ActivityCategory, String>>,
}

impl From<VotingView> for VotingStatusResponse {
    fn from(view: VotingView) -> Self {
        Self {
            is_voting_open: view.is_open,
            has_voted_both: view.has_voted_both,
            starts_at: view.window.as_ref().map(|w| w.starts_at.to_rfc3339()),
            ends_at: view.window.as_ref().map(|w| w.ends_at.to_rfc3339()),
            total_complete_voters: view.window.as_ref().map(|w| w.total_complete_voters),
            tally: view.tallies,
            winners: view.winners,
        }
    }
}

/// Submit a vote in both categories.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let Json(req) = payload?;

    let action = state
        .session
        .submit_ballot(
            &event_id,
            &user.id,
            BallotInput {
                presentation_option_id: req.presentation_option_id,
                twist_option_id: req.twist_option_id,
            },
        )
        .await?;

    Ok(ApiResponse::ok(VoteResponse { action }))
}

/// Voting status. Tallies appear once the vote is resolved.
async fn status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<VotingStatusResponse>> {
    let view = state.session.voting_status(&event_id, &user.id).await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Voting results, resolving the vote if the window has closed.
async fn results(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<VotingStatusResponse>> {
    let view = state.session.voting_results(&event_id, &user.id).await?;
    Ok(ApiResponse::ok(view.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vote", post(vote))
        .route("/voting/status", get(status))
        .route("/voting/results", get(results))
}
