//! Event and message data model (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The opaque structured payload a publisher sends, keyed by a caller-chosen
/// UUID (validated at ingress; see `session::frame`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub payload: serde_json::Value,
}

/// A published record: the unit of fan-out and replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub topic: String,
    pub message: Message,
    pub ts: DateTime<Utc>,
}

impl Event {
    pub fn new(topic: impl Into<String>, message: Message) -> Self {
        Self {
            topic: topic.into(),
            message,
            ts: Utc::now(),
        }
    }
}
