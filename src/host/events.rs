//! Host lifecycle events
//!
//! The host publishes `{ "type": ..., "properties": { ... } }` objects. Only
//! the fields the plugins read are decoded; unknown types are kept by name.

use serde::Deserialize;
use serde_json::Value;

use super::HostError;

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    SessionCreated {
        session_id: String,
    },
    SessionUpdated {
        session_id: String,
        title: Option<String>,
    },
    SessionIdle {
        session_id: String,
    },
    SessionCompacted {
        session_id: Option<String>,
        summary: Option<String>,
    },
    SessionError {
        session_id: Option<String>,
        /// Error text, `Unknown error` when the host sent none
        message: String,
    },
    CommandExecuted {
        session_id: String,
        name: String,
        arguments: String,
        message_id: Option<String>,
    },
    Other {
        kind: String,
    },
}

pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: Value,
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(|v| v.as_str())
}

fn owned_at(value: &Value, path: &[&str]) -> Option<String> {
    str_at(value, path).map(str::to_string)
}

fn required(value: &Value, path: &[&str], kind: &str) -> Result<String, HostError> {
    owned_at(value, path).ok_or_else(|| {
        HostError::Deserialize(format!("{} event missing {}", kind, path.join(".")))
    })
}

impl HostEvent {
    pub fn parse(json: &str) -> Result<Self, HostError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| HostError::Deserialize(format!("{}: {}", e, json)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, HostError> {
        let raw: RawEvent = serde_json::from_value(value)
            .map_err(|e| HostError::Deserialize(e.to_string()))?;
        let p = &raw.properties;
        let kind = raw.kind.as_str();

        let event = match kind {
            "session.created" => HostEvent::SessionCreated {
                session_id: required(p, &["info", "id"], kind)?,
            },
            "session.updated" => HostEvent::SessionUpdated {
                session_id: required(p, &["info", "id"], kind)?,
                title: owned_at(p, &["info", "title"]),
            },
            "session.idle" => HostEvent::SessionIdle {
                session_id: required(p, &["sessionID"], kind)?,
            },
            "session.compacted" => HostEvent::SessionCompacted {
                session_id: owned_at(p, &["sessionID"]).filter(|s| !s.is_empty()),
                summary: owned_at(p, &["summary"]),
            },
            "session.error" => HostEvent::SessionError {
                session_id: owned_at(p, &["sessionID"]),
                message: owned_at(p, &["error", "data", "message"])
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            },
            "command.executed" => HostEvent::CommandExecuted {
                session_id: required(p, &["sessionID"], kind)?,
                name: required(p, &["name"], kind)?,
                arguments: owned_at(p, &["arguments"]).unwrap_or_default(),
                message_id: owned_at(p, &["messageID"]),
            },
            _ => HostEvent::Other {
                kind: raw.kind.clone(),
            },
        };
        Ok(event)
    }

    /// Event type as published by the host
    pub fn kind(&self) -> &str {
        match self {
            HostEvent::SessionCreated { .. } => "session.created",
            HostEvent::SessionUpdated { .. } => "session.updated",
            HostEvent::SessionIdle { .. } => "session.idle",
            HostEvent::SessionCompacted { .. } => "session.compacted",
            HostEvent::SessionError { .. } => "session.error",
            HostEvent::CommandExecuted { .. } => "command.executed",
            HostEvent::Other { kind } => kind,
        }
    }
}
