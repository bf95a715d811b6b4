//! Re-prompts the agent once after a transient tool or connection error.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::{Plugin, PluginError};
use crate::host::{HostApi, HostEvent, MessageQuery, PromptRequest};

/// Error fragments worth a retry
pub const RETRYABLE_ERRORS: &[&str] = &[
    "Tool execution aborted",
    "The socket connection was closed unexpectedly",
];

pub const RETRY_PROMPT: &str =
    "You have encountered an error in the previous attempt. Please retry the last action.";

/// Recent messages checked for an earlier retry prompt
pub const RETRY_LOOKBACK: usize = 3;

/// Retry when the error is transient and the retry prompt is not among
/// `recent`, so a persistent failure cannot loop.
pub fn should_retry(recent: &[String], error_message: &str) -> bool {
    if !RETRYABLE_ERRORS.iter().any(|e| error_message.contains(e)) {
        return false;
    }
    !recent.iter().any(|m| m.contains(RETRY_PROMPT))
}

pub struct RetryPlugin {
    host: Arc<dyn HostApi>,
}

impl RetryPlugin {
    pub fn new(host: Arc<dyn HostApi>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Plugin for RetryPlugin {
    fn name(&self) -> &'static str {
        "retry"
    }

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError> {
        let HostEvent::SessionError {
            session_id: Some(session_id),
            message,
        } = event
        else {
            return Ok(());
        };
        if !should_retry(&[], message) {
            debug!(session_id = %session_id, error = %message, "Error is not retryable");
            return Ok(());
        }

        let messages = self.host.messages(session_id, &MessageQuery::default()).await?;
        let recent: Vec<String> = messages
            .iter()
            .skip(messages.len().saturating_sub(RETRY_LOOKBACK))
            .map(|m| m.text())
            .collect();
        if !should_retry(&recent, message) {
            debug!(session_id = %session_id, "Retry already requested");
            return Ok(());
        }

        info!(session_id = %session_id, error = %message, "Retrying after transient error");
        self.host.prompt(session_id, &PromptRequest::reply(RETRY_PROMPT)).await?;
        Ok(())
    }
}
