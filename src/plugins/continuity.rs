//! Loads the previous session's summary into every new session.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{Plugin, PluginError};
use crate::handoff::latest_session_summary;
use crate::host::{HostApi, HostEvent, PromptRequest};

pub struct ContinuityPlugin {
    host: Arc<dyn HostApi>,
    project_dir: PathBuf,
}

impl ContinuityPlugin {
    pub fn new(host: Arc<dyn HostApi>, project_dir: PathBuf) -> Self {
        Self { host, project_dir }
    }
}

pub fn last_session_block(summary: &str) -> String {
    format!("<last-session>\n\n{}\n</last-session>", summary)
}

#[async_trait]
impl Plugin for ContinuityPlugin {
    fn name(&self) -> &'static str {
        "continuity"
    }

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError> {
        let HostEvent::SessionCreated { session_id } = event else {
            return Ok(());
        };
        let Some(summary) = latest_session_summary(&self.project_dir) else {
            return Ok(());
        };

        info!(session_id = %session_id, "Loading previous session summary");
        self.host
            .prompt(session_id, &PromptRequest::context(last_session_block(&summary)))
            .await?;
        Ok(())
    }
}
