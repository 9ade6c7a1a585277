use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::media::ErrorResponse;
use crate::routes::AppState;
use crate::stories::{NewStory, Story};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    pub user_id: String,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { error: message.to_string() })).into_response()
}

fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Story not found")
}

pub async fn list_stories(State(state): State<AppState>) -> Json<Vec<Story>> {
    Json(state.stories.list(Utc::now()).await)
}

pub async fn create_story(
    State(state): State<AppState>,
    Json(story): Json<NewStory>,
) -> Result<(StatusCode, Json<Story>), Response> {
    if story.user_id.trim().is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "userId is required"));
    }
    if story.media_url.trim().is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "mediaUrl is required"));
    }
    let story = state.stories.create(story, Utc::now()).await;
    tracing::info!(story_id = %story.id, user_id = %story.user_id, "story created");
    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Story>, Response> {
    state
        .stories
        .get(id, Utc::now())
        .await
        .map(Json)
        .ok_or_else(not_found)
}

pub async fn delete_story(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if state.stories.delete(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found()
    }
}

pub async fn view_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(view): Json<ViewRequest>,
) -> Result<Json<Story>, Response> {
    if view.user_id.trim().is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "userId is required"));
    }
    state
        .stories
        .record_view(id, view.user_id.trim(), Utc::now())
        .await
        .map(Json)
        .ok_or_else(not_found)
}
