//! Reissues an externally supplied system prompt on new and compacted
//! sessions, so the agent keeps it after compaction.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{Plugin, PluginError};
use crate::host::{HostApi, HostEvent, PromptRequest};

pub struct SystemPromptPlugin {
    host: Arc<dyn HostApi>,
    prompt: Option<String>,
}

impl SystemPromptPlugin {
    pub fn new(host: Arc<dyn HostApi>, prompt: Option<String>) -> Self {
        Self { host, prompt }
    }
}

#[async_trait]
impl Plugin for SystemPromptPlugin {
    fn name(&self) -> &'static str {
        "system-prompt"
    }

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError> {
        let Some(ref prompt) = self.prompt else {
            return Ok(());
        };
        let session_id = match event {
            HostEvent::SessionCreated { session_id } => session_id,
            HostEvent::SessionCompacted {
                session_id: Some(session_id),
                ..
            } => session_id,
            _ => return Ok(()),
        };

        debug!(session_id = %session_id, event = %event.kind(), "Injecting system prompt");
        self.host
            .prompt(session_id, &PromptRequest::context(format!("{}\n", prompt)))
            .await?;
        Ok(())
    }
}
