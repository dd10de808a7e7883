//! Activity catalog endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use mixer_common::AppResult;
use mixer_db::entities::{ActivityCategory, activity_option};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Activity option response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOptionResponse {
    pub id: String,
    pub category: ActivityCategory,
    pub variant: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sort_order: i32,
}

impl From<activity_option::Model> for ActivityOptionResponse {
    fn from(option: activity_option::Model) -> Self {
        Self {
            id: option.id,
            category: option.category,
            variant: option.variant,
            label: option.label,
            description: option.description,
            sort_order: option.sort_order,
        }
    }
}

/// Both categories of active options.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesResponse {
    pub presentation_styles: Vec<ActivityOptionResponse>,
    pub twists: Vec<ActivityOptionResponse>,
}

/// List the options attendees can vote for.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<ActivitiesResponse>> {
    let menu = state.session.list_activities(&event_id, &user.id).await?;

    Ok(ApiResponse::ok(ActivitiesResponse {
        presentation_styles: menu.presentation_styles.into_iter().map(Into::into).collect(),
        twists: menu.twists.into_iter().map(Into::into).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/activities", get(list))
}
