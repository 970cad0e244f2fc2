//! HTTP error mapping for the administrative surface (spec.md §6, §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::kernel::RegistryError;

/// Maps registry/adapter failures to the HTTP statuses spec.md §6 names:
/// 400 bad input, 404 missing topic, 409 duplicate create. The 500 case is
/// handled separately by `api::server`'s panic-catching layer, since no
/// operation in this thin adapter otherwise fails unexpectedly.
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::TopicAlreadyExists(name) => {
                ApiError::Conflict(format!("topic '{name}' already exists"))
            }
            RegistryError::TopicNotFound(name) => {
                ApiError::NotFound(format!("topic '{name}' not found"))
            }
            RegistryError::SubscriptionNotFound { client_id, topic } => ApiError::NotFound(
                format!("client '{client_id}' is not subscribed to '{topic}'"),
            ),
            RegistryError::InvalidTopicName => {
                ApiError::BadRequest("name must not be empty".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, Value) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "error": message })),
        };
        (status, Json(body)).into_response()
    }
}
