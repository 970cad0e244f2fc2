use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::server::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.registry.get_health();
    Json(json!({
        "uptime_sec": snapshot.uptime_sec,
        "topics": snapshot.topics,
        "subscribers": snapshot.subscribers,
    }))
}
