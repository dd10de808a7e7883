//! Coach endpoints: voting window control and the presentation queue.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use mixer_common::{AppError, AppResult};
use mixer_core::{AdvanceOutcome, Resolution};
use mixer_db::entities::{ActivityCategory, PresentationState, voting_window};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, round_score},
};

/// Open voting request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenVotingRequest {
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: DateTime<Utc>,
}

/// Voting window response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowResponse {
    pub starts_at: String,
    pub ends_at: String,
    pub is_active: bool,
    pub total_complete_voters: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl From<voting_window::Model> for WindowResponse {
    fn from(window: voting_window::Model) -> Self {
        Self {
            starts_at: window.starts_at.to_rfc3339(),
            ends_at: window.ends_at.to_rfc3339(),
            is_active: window.is_active,
            total_complete_voters: window.total_complete_voters,
            resolved_at: window.resolved_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Resolution response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub newly_resolved: bool,
    pub queue_seeded: bool,
    pub winners: BTreeMap<ActivityCategory, String>,
    pub total_complete_voters: i32,
}

impl From<Resolution> for ResolveResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            newly_resolved: resolution.newly_resolved,
            queue_seeded: resolution.queue_seeded,
            winners: resolution.window.winner_by_category(),
            total_complete_voters: resolution.window.total_complete_voters,
        }
    }
}

/// Advance request. The body is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    pub expected_version: Option<i32>,
}

/// Advance response.
#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presenter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presenter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_advanced: Option<bool>,
    pub version: i32,
}

/// Queue entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryResponse {
    pub presenter_id: String,
    pub presenter_name: String,
    pub order: i32,
    pub state: PresentationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Queue overview response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    pub seeded: bool,
    pub completed_count: u64,
    pub total_count: u64,
    pub version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_presenter_id: Option<String>,
    pub entries: Vec<QueueEntryResponse>,
}

/// Ranking row response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub rank: usize,
    pub presenter_id: String,
    pub presenter_name: String,
    pub average_score: f64,
    pub rating_count: i64,
}

/// Rankings response.
#[derive(Serialize)]
pub struct RankingsResponse {
    pub rankings: Vec<RankingResponse>,
}

/// Open the voting window.
async fn open_voting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    payload: Result<Json<OpenVotingRequest>, JsonRejection>,
) -> AppResult<ApiResponse<WindowResponse>> {
    let Json(req) = payload?;
    let window = state
        .session
        .open_voting(&event_id, &user.id, req.starts_at, req.ends_at)
        .await?;
    Ok(ApiResponse::ok(window.into()))
}

/// Close the voting window now.
async fn close_voting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<WindowResponse>> {
    let window = state.session.close_voting(&event_id, &user.id).await?;
    Ok(ApiResponse::ok(window.into()))
}

/// Resolve the winners and seed the queue.
async fn resolve_voting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<ResolveResponse>> {
    let resolution = state.session.resolve_voting(&event_id, &user.id).await?;
    Ok(ApiResponse::ok(resolution.into()))
}

/// Move the queue to the next presenter.
async fn advance(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    body: Bytes,
) -> AppResult<ApiResponse<AdvanceResponse>> {
    let req: AdvanceRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AdvanceRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid advance request: {e}")))?
    };

    let result = state
        .session
        .advance(&event_id, &user.id, req.expected_version)
        .await?;

    let response = match result.outcome {
        AdvanceOutcome::Presenting { entry, version } => AdvanceResponse {
            presenter_id: Some(entry.presenter_id),
            presenter_name: result.presenter_name,
            order: Some(entry.position),
            version,
            ..AdvanceResponse::default()
        },
        AdvanceOutcome::AllCompleted {
            completed_count,
            total_count,
            version,
        } => AdvanceResponse {
            all_completed: Some(true),
            completed_count: Some(completed_count),
            total_count: Some(total_count),
            version,
            ..AdvanceResponse::default()
        },
        AdvanceOutcome::Superseded { current, version } => {
            debug!(event_id = %event_id, coach_id = %user.id, version, "Advance superseded");
            AdvanceResponse {
                order: current.as_ref().map(|e| e.position),
                presenter_id: current.map(|e| e.presenter_id),
                presenter_name: result.presenter_name,
                already_advanced: Some(true),
                version,
                ..AdvanceResponse::default()
            }
        }
    };

    Ok(ApiResponse::ok(response))
}

/// Full queue with progress.
async fn queue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<QueueResponse>> {
    let overview = state.session.queue_overview(&event_id, &user.id).await?;

    let entries = overview
        .slots
        .into_iter()
        .map(|slot| QueueEntryResponse {
            presenter_id: slot.entry.presenter_id,
            presenter_name: slot.presenter_name,
            order: slot.entry.position,
            state: slot.entry.state,
            started_at: slot.entry.started_at.map(|t| t.to_rfc3339()),
            completed_at: slot.entry.completed_at.map(|t| t.to_rfc3339()),
        })
        .collect();

    Ok(ApiResponse::ok(QueueResponse {
        seeded: overview.progress.is_some(),
        completed_count: overview.progress.map_or(0, |p| p.completed_count),
        total_count: overview.progress.map_or(0, |p| p.total_count),
        version: overview.progress.map_or(0, |p| p.version),
        next_presenter_id: overview.up_next,
        entries,
    }))
}

/// Rankings of every rated presenter.
async fn rankings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<RankingsResponse>> {
    let rows = state.session.rankings(&event_id, &user.id).await?;

    let rankings = rows
        .into_iter()
        .map(|row| RankingResponse {
            rank: row.rank,
            average_score: round_score(row.score.average()),
            rating_count: row.score.count,
            presenter_id: row.score.presenter_id,
            presenter_name: row.presenter_name,
        })
        .collect();

    Ok(ApiResponse::ok(RankingsResponse { rankings }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voting/open", post(open_voting))
        .route("/voting/close", post(close_voting))
        .route("/voting/resolve", post(resolve_voting))
        .route("/presentations", get(queue))
        .route("/presentations/advance", post(advance))
        .route("/presentations/rankings", get(rankings))
}
