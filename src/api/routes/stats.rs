use axum::extract::State;
use axum::Json;
use serde_json::{json, Map, Value};

use crate::api::server::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let topics: Map<String, Value> = state
        .registry
        .get_stats()
        .into_iter()
        .map(|(name, stats)| {
            (
                name,
                json!({ "messages": stats.messages, "subscribers": stats.subscribers }),
            )
        })
        .collect();
    Json(json!({ "topics": topics }))
}
