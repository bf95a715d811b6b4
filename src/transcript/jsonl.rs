//! JSONL transcript reading
//!
//! Parses an agent's JSONL conversation log into conversation messages and the
//! latest todo list, for handoffs generated outside a running host.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use super::message::{keep_recent, Message, Role, Todo};

/// Placeholder text the agent writes for empty turns
const NO_CONTENT_PLACEHOLDER: &str = "(no content)";

/// Conversation extracted from a transcript file
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub messages: Vec<Message>,
    pub todos: Vec<Todo>,
}

/// Read a transcript file. A missing or unreadable file is an empty transcript.
pub fn read_transcript(path: &Path) -> Transcript {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_transcript(&content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read transcript");
            Transcript::default()
        }
    }
}

/// Parse JSONL content. Lines that are not valid JSON are skipped.
pub fn parse_transcript(content: &str) -> Transcript {
    let entries: Vec<Value> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let messages: Vec<Message> = entries.iter().filter_map(entry_to_message).collect();
    let todos = latest_todos(&entries);

    debug!(entries = entries.len(), messages = messages.len(), todos = todos.len(), "Parsed transcript");
    Transcript {
        messages: keep_recent(messages),
        todos,
    }
}

fn entry_to_message(entry: &Value) -> Option<Message> {
    let entry_type = entry.get("type").and_then(|t| t.as_str())?;
    if entry_type != "user" && entry_type != "assistant" {
        return None;
    }

    let message = entry.get("message")?;
    let role = message.get("role").and_then(|r| r.as_str()).and_then(Role::parse)?;
    let content = message.get("content")?;

    let text = if let Some(s) = content.as_str() {
        s.to_string()
    } else if let Some(blocks) = content.as_array() {
        // Tool output echoed back as a user turn is verbose file content
        let is_tool_result = blocks
            .iter()
            .any(|b| b.get("type").and_then(|t| t.as_str()) == Some("tool_result"));
        if is_tool_result {
            return None;
        }

        let mut parts = Vec::new();
        let mut tool_calls = 0usize;
        for block in blocks {
            if let Some(s) = block.as_str() {
                parts.push(s.to_string());
                continue;
            }
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    let text = block.get("text").and_then(|t| t.as_str()).unwrap_or("");
                    let trimmed = text.trim();
                    if !trimmed.is_empty() && trimmed != NO_CONTENT_PLACEHOLDER {
                        parts.push(text.to_string());
                    }
                }
                Some("tool_use") => tool_calls += 1,
                _ => {}
            }
        }

        if parts.is_empty() {
            return None;
        }
        let mut text = parts.join("\n");
        if tool_calls > 0 {
            text.push_str(&format!(" [+{} tool call(s)]", tool_calls));
        }
        text
    } else {
        return None;
    };

    Message::from_raw(role, &text)
}

/// The last todo list written by the agent's todo tool
fn latest_todos(entries: &[Value]) -> Vec<Todo> {
    entries
        .iter()
        .filter(|e| e.get("type").and_then(|t| t.as_str()) == Some("user"))
        .filter_map(|e| e.get("toolUseResult").and_then(|r| r.get("newTodos")))
        .filter_map(|todos| serde_json::from_value::<Vec<Todo>>(todos.clone()).ok())
        .last()
        .unwrap_or_default()
}
