//! Inbound frame schema and validation (spec.md §4.4).
//!
//! Parsing is hand-rolled rather than a tagged `Deserialize` impl so the
//! validation order in §4.4 — JSON object, then `type`, then per-type
//! required fields, then UUID format — produces exactly the error the
//! table specifies, in that order, regardless of which fields are absent.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::kernel::Message;

fn uuid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[1-5][0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$")
            .expect("static UUID pattern is valid")
    })
}

#[derive(Debug, Clone)]
pub enum ClientFrame {
    Subscribe {
        request_id: Option<String>,
        topic: String,
        client_id: String,
        last_n: usize,
    },
    Unsubscribe {
        request_id: Option<String>,
        topic: String,
        client_id: String,
    },
    Publish {
        request_id: Option<String>,
        topic: String,
        message: Message,
    },
    Ping {
        request_id: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct FrameError {
    pub request_id: Option<String>,
    pub message: String,
}

/// Parse and validate one inbound text frame, per spec.md §4.4's ordered
/// validation: JSON object, `type`, per-type required fields, UUID format.
pub fn parse(text: &str) -> Result<ClientFrame, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(|_| FrameError {
        request_id: None,
        message: "Invalid JSON format".to_string(),
    })?;

    let obj = value.as_object().ok_or_else(|| FrameError {
        request_id: None,
        message: "Invalid JSON format".to_string(),
    })?;

    let request_id = obj
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    let frame_type = obj.get("type").and_then(Value::as_str).ok_or_else(|| FrameError {
        request_id: request_id.clone(),
        message: "missing or invalid 'type' field".to_string(),
    })?;

    let required_str = |key: &str| -> Result<String, FrameError> {
        obj.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| FrameError {
                request_id: request_id.clone(),
                message: format!("missing or empty required field '{key}'"),
            })
    };

    match frame_type {
        "subscribe" => {
            let topic = required_str("topic")?;
            let client_id = required_str("client_id")?;
            let last_n = obj
                .get("last_n")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize;
            Ok(ClientFrame::Subscribe {
                request_id,
                topic,
                client_id,
                last_n,
            })
        }
        "unsubscribe" => {
            let topic = required_str("topic")?;
            let client_id = required_str("client_id")?;
            Ok(ClientFrame::Unsubscribe {
                request_id,
                topic,
                client_id,
            })
        }
        "publish" => {
            let topic = required_str("topic")?;
            let message_obj = obj
                .get("message")
                .and_then(Value::as_object)
                .ok_or_else(|| FrameError {
                    request_id: request_id.clone(),
                    message: "missing or invalid required field 'message'".to_string(),
                })?;

            let id_str = message_obj
                .get("id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| FrameError {
                    request_id: request_id.clone(),
                    message: "missing or empty required field 'message.id'".to_string(),
                })?;
            if !uuid_re().is_match(id_str) {
                return Err(FrameError {
                    request_id: request_id.clone(),
                    message: "message.id must be a valid UUID".to_string(),
                });
            }
            let id = Uuid::parse_str(id_str).map_err(|_| FrameError {
                request_id: request_id.clone(),
                message: "message.id must be a valid UUID".to_string(),
            })?;
            let payload = message_obj.get("payload").cloned().unwrap_or(Value::Null);

            Ok(ClientFrame::Publish {
                request_id,
                topic,
                message: Message { id, payload },
            })
        }
        "ping" => Ok(ClientFrame::Ping { request_id }),
        other => Err(FrameError {
            request_id,
            message: format!("unknown frame type '{other}'"),
        }),
    }
}
