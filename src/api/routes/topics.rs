use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::server::AppState;
use crate::api::types::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateTopicBody {
    #[serde(default)]
    name: Option<String>,
}

pub async fn list_topics(State(state): State<AppState>) -> impl IntoResponse {
    let topics: Vec<_> = state
        .registry
        .list_topics()
        .into_iter()
        .map(|t| json!({ "name": t.name, "subscribers": t.subscriber_count }))
        .collect();
    Json(json!({ "topics": topics }))
}

pub async fn create_topic(
    State(state): State<AppState>,
    Json(body): Json<CreateTopicBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.as_deref().unwrap_or("").trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let result = state.registry.create_topic(name)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "created", "topic": result.name })),
    ))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.registry.delete_topic(&name)?;
    Ok(Json(json!({ "status": "deleted", "topic": result.name })))
}
