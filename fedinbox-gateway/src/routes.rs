use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize)]
struct ShareRequest {
    #[serde(rename = "postContent")]
    post_content: Option<String>,
}

#[derive(Deserialize)]
struct StatusIdRequest {
    id: Option<String>,
}

/// Decode a JSON body leniently: an empty or malformed body is treated the
/// same as one missing the field.
fn required<T, F>(body: &Bytes, field: &'static str, pick: F) -> Result<String, ApiError>
where
    T: for<'de> Deserialize<'de>,
    F: FnOnce(T) -> Option<String>,
{
    serde_json::from_slice::<T>(body)
        .ok()
        .and_then(pick)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::MissingField(field))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn timeline_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Value>> {
    let posts = state
        .upstream
        .public_timeline(state.timeline_limit)
        .await
        .map_err(|e| ApiError::opaque("Failed to fetch posts", &e))?;
    Ok(Json(posts))
}

pub async fn share_handler(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Value> {
    let status = required(&body, "postContent", |r: ShareRequest| r.post_content)?;

    info!(chars = status.chars().count(), "Sharing post");
    let created = state
        .upstream
        .create_status(&status)
        .await
        .map_err(|e| ApiError::upstream("Failed to share post", &e))?;
    Ok(Json(created))
}

pub async fn favorite_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Value> {
    let id = required(&body, "id", |r: StatusIdRequest| r.id)?;

    let status = state
        .upstream
        .favourite(&id)
        .await
        .map_err(|e| ApiError::upstream("Failed to favorite post", &e))?;
    Ok(Json(status))
}

pub async fn unfavorite_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Value> {
    let id = required(&body, "id", |r: StatusIdRequest| r.id)?;

    let status = state
        .upstream
        .unfavourite(&id)
        .await
        .map_err(|e| ApiError::upstream("Failed to unfavorite post", &e))?;
    Ok(Json(status))
}

pub async fn favorites_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Value>> {
    let list = state
        .upstream
        .favourites()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch favorites", &e))?;
    Ok(Json(list))
}
