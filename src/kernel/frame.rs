//! Server-emitted wire frames (spec.md §6).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::event::{Event, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    TopicNotFound,
    SlowConsumer,
    InternalError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoKind {
    Connected,
    TopicDeleted,
}

/// Every frame type a session's transport may receive, tagged by `type`
/// exactly as spec.md §6's frame table specifies.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "info")]
    Info {
        msg: InfoKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        ts: DateTime<Utc>,
    },
    #[serde(rename = "ack")]
    Ack {
        request_id: Option<String>,
        topic: String,
        status: &'static str,
        ts: DateTime<Utc>,
    },
    #[serde(rename = "event")]
    Event {
        topic: String,
        message: Message,
        ts: DateTime<Utc>,
    },
    #[serde(rename = "error")]
    Error {
        request_id: Option<String>,
        error: ErrorBody,
        ts: DateTime<Utc>,
    },
    #[serde(rename = "pong")]
    Pong {
        request_id: Option<String>,
        ts: DateTime<Utc>,
    },
}

impl ServerFrame {
    pub fn connected(client_id: impl Into<String>) -> Self {
        ServerFrame::Info {
            msg: InfoKind::Connected,
            client_id: Some(client_id.into()),
            topic: None,
            ts: Utc::now(),
        }
    }

    pub fn topic_deleted(topic: impl Into<String>) -> Self {
        ServerFrame::Info {
            msg: InfoKind::TopicDeleted,
            client_id: None,
            topic: Some(topic.into()),
            ts: Utc::now(),
        }
    }

    pub fn ack(request_id: Option<String>, topic: impl Into<String>) -> Self {
        ServerFrame::Ack {
            request_id,
            topic: topic.into(),
            status: "ok",
            ts: Utc::now(),
        }
    }

    pub fn event(event: Event) -> Self {
        ServerFrame::Event {
            topic: event.topic,
            message: event.message,
            ts: event.ts,
        }
    }

    pub fn error(request_id: Option<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        ServerFrame::Error {
            request_id,
            error: ErrorBody {
                code,
                message: message.into(),
            },
            ts: Utc::now(),
        }
    }

    pub fn pong(request_id: Option<String>) -> Self {
        ServerFrame::Pong {
            request_id,
            ts: Utc::now(),
        }
    }
}
