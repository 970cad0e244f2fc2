//! Registry failure taxonomy (spec.md §7).

use thiserror::Error;

use super::frame::ErrorCode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("topic '{0}' already exists")]
    TopicAlreadyExists(String),

    #[error("topic '{0}' not found")]
    TopicNotFound(String),

    #[error("topic name must not be empty")]
    InvalidTopicName,

    #[error("client '{client_id}' is not subscribed to '{topic}'")]
    SubscriptionNotFound { client_id: String, topic: String },
}

impl RegistryError {
    /// Map to the wire error code surfaced to session clients (spec.md §7).
    pub fn wire_code(&self) -> ErrorCode {
        match self {
            RegistryError::TopicAlreadyExists(_) => ErrorCode::BadRequest,
            RegistryError::TopicNotFound(_) => ErrorCode::TopicNotFound,
            RegistryError::SubscriptionNotFound { .. } => ErrorCode::TopicNotFound,
            RegistryError::InvalidTopicName => ErrorCode::BadRequest,
        }
    }
}
