//! Host HTTP Client
//!
//! The RPC surface the plugins consume, and its implementation over the
//! host's local HTTP server using reqwest.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

use super::stream::EventSubscription;
use super::HostError;
use crate::transcript::{Message, Role, Todo};

/// Session metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub directory: Option<String>,
}

/// Title the host gives sessions before one is generated
pub const DEFAULT_TITLE_PREFIX: &str = "New session - ";

impl SessionInfo {
    pub fn has_custom_title(&self) -> bool {
        !self.title.is_empty() && !self.title.starts_with(DEFAULT_TITLE_PREFIX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: String,
    pub role: String,
}

/// Message part; only text is read
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    Text {
        text: String,
        #[serde(default)]
        synthetic: bool,
    },
    #[serde(other)]
    Other,
}

/// A transcript entry as the host returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostMessage {
    pub info: MessageInfo,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl HostMessage {
    /// All text parts joined by newlines
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text, .. } => Some(text.as_str()),
                Part::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Conversation message for compaction, None for blank or non-chat roles
    pub fn to_message(&self) -> Option<Message> {
        let role = Role::parse(&self.info.role)?;
        let text = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text, synthetic: false } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        Message::from_raw(role, &text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    pub limit: Option<usize>,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Info,
    Success,
    Warning,
    Error,
}

/// Text submitted into a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub text: String,
    /// Inject context without generating a reply
    pub no_reply: bool,
}

impl PromptRequest {
    pub fn context(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            no_reply: true,
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            no_reply: false,
        }
    }
}

/// Host operations used by the plugins
#[async_trait]
pub trait HostApi: Send + Sync {
    async fn session(&self, session_id: &str) -> Result<SessionInfo, HostError>;
    async fn messages(&self, session_id: &str, query: &MessageQuery) -> Result<Vec<HostMessage>, HostError>;
    async fn todos(&self, session_id: &str) -> Result<Vec<Todo>, HostError>;
    async fn prompt(&self, session_id: &str, request: &PromptRequest) -> Result<(), HostError>;
    /// Revert a session to before `message_id`
    async fn revert(&self, session_id: &str, message_id: &str) -> Result<(), HostError>;
    async fn show_toast(&self, title: &str, message: &str, variant: ToastVariant) -> Result<(), HostError>;
    /// Append text to the input box
    async fn append_prompt(&self, text: &str) -> Result<(), HostError>;
}

/// Host HTTP client
#[derive(Clone)]
pub struct HttpHostClient {
    http: Client,
    base_url: String,
    directory: Option<String>,
}

impl HttpHostClient {
    pub fn new(base_url: &str) -> Self {
        // No overall timeout: the event stream stays open indefinitely
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            directory: None,
        }
    }

    /// Scope every request to a project directory
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the project directory, an explicit one winning over the client's
    fn scoped(&self, builder: RequestBuilder, directory: Option<&str>) -> RequestBuilder {
        match directory.or(self.directory.as_deref()) {
            Some(dir) => builder.query(&[("directory", dir)]),
            None => builder,
        }
    }

    fn get(&self, path: &str, directory: Option<&str>) -> RequestBuilder {
        self.scoped(self.http.get(self.url(path)), directory)
    }

    fn post(&self, path: &str, body: &serde_json::Value) -> RequestBuilder {
        self.scoped(self.http.post(self.url(path)).json(body), None)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<String, HostError> {
        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            error!(status = %status, request = %what, "Host request failed");
            return Err(HostError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T, HostError> {
        let text = self.send(builder, what).await?;
        serde_json::from_str(&text).map_err(|e| HostError::Deserialize(format!("{}: {}", e, text)))
    }

    /// Subscribe to the host event bus
    pub async fn subscribe(&self) -> Result<EventSubscription, HostError> {
        let resp = self
            .get("/event", None)
            .header("accept", "text/event-stream")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(HostError::Status {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        debug!(url = %self.base_url, "Subscribed to host events");
        Ok(EventSubscription::new(resp))
    }
}

#[async_trait]
impl HostApi for HttpHostClient {
    async fn session(&self, session_id: &str) -> Result<SessionInfo, HostError> {
        let req = self.get(&format!("/session/{}", session_id), None);
        self.send_json(req, "session.get").await
    }

    async fn messages(&self, session_id: &str, query: &MessageQuery) -> Result<Vec<HostMessage>, HostError> {
        let mut req = self.get(&format!("/session/{}/message", session_id), query.directory.as_deref());
        if let Some(limit) = query.limit {
            req = req.query(&[("limit", limit.to_string())]);
        }
        self.send_json(req, "session.messages").await
    }

    async fn todos(&self, session_id: &str) -> Result<Vec<Todo>, HostError> {
        let req = self.get(&format!("/session/{}/todo", session_id), None);
        self.send_json(req, "session.todo").await
    }

    async fn prompt(&self, session_id: &str, request: &PromptRequest) -> Result<(), HostError> {
        let body = json!({
            "noReply": request.no_reply,
            "parts": [{ "type": "text", "text": request.text }],
        });
        let req = self.post(&format!("/session/{}/message", session_id), &body);
        self.send(req, "session.prompt").await.map(|_| ())
    }

    async fn revert(&self, session_id: &str, message_id: &str) -> Result<(), HostError> {
        let req = self.post(
            &format!("/session/{}/revert", session_id),
            &json!({ "messageID": message_id }),
        );
        self.send(req, "session.revert").await.map(|_| ())
    }

    async fn show_toast(&self, title: &str, message: &str, variant: ToastVariant) -> Result<(), HostError> {
        let body = json!({
            "title": title,
            "message": message,
            "variant": variant,
        });
        let req = self.post("/tui/show-toast", &body);
        self.send(req, "tui.showToast").await.map(|_| ())
    }

    async fn append_prompt(&self, text: &str) -> Result<(), HostError> {
        let req = self.post("/tui/append-prompt", &json!({ "text": text }));
        self.send(req, "tui.appendPrompt").await.map(|_| ())
    }
}
