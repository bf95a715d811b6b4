//! Transcript data model
//!
//! Role-tagged messages and todo items as they flow from the host (or a
//! JSONL transcript) into compaction and summarization.

use serde::{Deserialize, Serialize};

/// Maximum characters kept per message before the ellipsis marker
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Only the most recent messages of a session are considered
pub const MAX_TRANSCRIPT_MESSAGES: usize = 30;

/// Marker appended to truncated content
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a host/transcript role string. Anything else (system, tool) is not
    /// part of the conversation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Build a message from raw text: trimmed, truncated to `MAX_MESSAGE_CHARS`.
    /// Returns None for blank text.
    pub fn from_raw(role: Role, text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self::new(role, truncate_content(trimmed, MAX_MESSAGE_CHARS)))
    }

    /// Length in characters (the unit of the compaction budget)
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Truncate to `max_chars` characters, appending the ellipsis marker when cut
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push_str(ELLIPSIS);
        out
    }
}

/// Keep only the newest `MAX_TRANSCRIPT_MESSAGES` messages
pub fn keep_recent(mut messages: Vec<Message>) -> Vec<Message> {
    if messages.len() > MAX_TRANSCRIPT_MESSAGES {
        messages.drain(..messages.len() - MAX_TRANSCRIPT_MESSAGES);
    }
    messages
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl Default for TodoStatus {
    fn default() -> Self {
        TodoStatus::Pending
    }
}

/// Todo item tracked by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_form: Option<String>,
}

impl Todo {
    pub fn new(content: impl Into<String>, status: TodoStatus) -> Self {
        Self {
            content: content.into(),
            status,
            active_form: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_truncates_with_marker() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 20);
        let msg = Message::from_raw(Role::User, &long).unwrap();
        assert_eq!(msg.char_len(), MAX_MESSAGE_CHARS + ELLIPSIS.len());
        assert!(msg.content.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_from_raw_skips_blank() {
        assert!(Message::from_raw(Role::Assistant, "   \n ").is_none());
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_content("héllo", 5), "héllo");
        assert_eq!(truncate_content("héllo", 2), "hé...");
    }

    #[test]
    fn test_keep_recent() {
        let messages: Vec<_> = (0..40).map(|i| Message::user(format!("m{}", i))).collect();
        let kept = keep_recent(messages);
        assert_eq!(kept.len(), MAX_TRANSCRIPT_MESSAGES);
        assert_eq!(kept[0].content, "m10");
    }

    #[test]
    fn test_todo_status_unknown_value() {
        let todo: Todo = serde_json::from_str(r#"{"content":"x","status":"blocked"}"#).unwrap();
        assert_eq!(todo.status, TodoStatus::Unknown);
        let todo: Todo = serde_json::from_str(r#"{"content":"y","status":"in_progress"}"#).unwrap();
        assert_eq!(todo.status, TodoStatus::InProgress);
    }
}
