//! In-memory host for plugin tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use super::client::{HostApi, HostMessage, MessageInfo, MessageQuery, Part, PromptRequest, SessionInfo, ToastVariant};
use super::HostError;
use crate::transcript::Todo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Session(String),
    Messages { session_id: String, limit: Option<usize> },
    Todos(String),
    Prompt { session_id: String, text: String, no_reply: bool },
    Revert { session_id: String, message_id: String },
    Toast { title: String, message: String, variant: ToastVariant },
    AppendPrompt(String),
}

/// Serves canned sessions and transcripts, records every call.
#[derive(Default)]
pub struct RecordingHost {
    sessions: Mutex<HashMap<String, SessionInfo>>,
    messages: Mutex<Vec<HostMessage>>,
    todos: Mutex<Vec<Todo>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<HostCall>>,
}

pub fn host_message(id: &str, role: &str, text: &str) -> HostMessage {
    HostMessage {
        info: MessageInfo {
            id: id.to_string(),
            role: role.to_string(),
        },
        parts: vec![Part::Text {
            text: text.to_string(),
            synthetic: false,
        }],
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, id: &str, title: &str) -> Self {
        self.sessions.lock().insert(
            id.to_string(),
            SessionInfo {
                id: id.to_string(),
                title: title.to_string(),
                directory: None,
            },
        );
        self
    }

    pub fn with_messages(self, messages: Vec<HostMessage>) -> Self {
        *self.messages.lock() = messages;
        self
    }

    pub fn with_todos(self, todos: Vec<Todo>) -> Self {
        *self.todos.lock() = todos;
        self
    }

    /// Make one operation fail: session, messages, todos, prompt, revert,
    /// toast or append_prompt.
    pub fn failing(self, op: &'static str) -> Self {
        self.failing.lock().insert(op);
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub fn prompts(&self) -> Vec<(String, String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Prompt { session_id, text, no_reply } => Some((session_id, text, no_reply)),
                _ => None,
            })
            .collect()
    }

    pub fn toasts(&self) -> Vec<(String, ToastVariant)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Toast { message, variant, .. } => Some((message, variant)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: &'static str, call: HostCall) -> Result<(), HostError> {
        self.calls.lock().push(call);
        if self.failing.lock().contains(op) {
            return Err(HostError::Status {
                status: 500,
                body: format!("{} unavailable", op),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HostApi for RecordingHost {
    async fn session(&self, session_id: &str) -> Result<SessionInfo, HostError> {
        self.record("session", HostCall::Session(session_id.to_string()))?;
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| HostError::Status {
                status: 404,
                body: format!("no session {}", session_id),
            })
    }

    async fn messages(&self, session_id: &str, query: &MessageQuery) -> Result<Vec<HostMessage>, HostError> {
        self.record(
            "messages",
            HostCall::Messages {
                session_id: session_id.to_string(),
                limit: query.limit,
            },
        )?;
        let all = self.messages.lock().clone();
        let skip = query.limit.map(|l| all.len().saturating_sub(l)).unwrap_or(0);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn todos(&self, session_id: &str) -> Result<Vec<Todo>, HostError> {
        self.record("todos", HostCall::Todos(session_id.to_string()))?;
        Ok(self.todos.lock().clone())
    }

    async fn prompt(&self, session_id: &str, request: &PromptRequest) -> Result<(), HostError> {
        self.record(
            "prompt",
            HostCall::Prompt {
                session_id: session_id.to_string(),
                text: request.text.clone(),
                no_reply: request.no_reply,
            },
        )
    }

    async fn revert(&self, session_id: &str, message_id: &str) -> Result<(), HostError> {
        self.record(
            "revert",
            HostCall::Revert {
                session_id: session_id.to_string(),
                message_id: message_id.to_string(),
            },
        )
    }

    async fn show_toast(&self, title: &str, message: &str, variant: ToastVariant) -> Result<(), HostError> {
        self.record(
            "toast",
            HostCall::Toast {
                title: title.to_string(),
                message: message.to_string(),
                variant,
            },
        )
    }

    async fn append_prompt(&self, text: &str) -> Result<(), HostError> {
        self.record("append_prompt", HostCall::AppendPrompt(text.to_string()))
    }
}
