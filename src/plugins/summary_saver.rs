//! Writes the host's compaction summary to disk for the next session.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{Plugin, PluginError};
use crate::handoff::save_session_summary;
use crate::host::HostEvent;

pub struct SummarySaverPlugin {
    project_dir: PathBuf,
}

impl SummarySaverPlugin {
    pub fn new(project_dir: PathBuf) -> Self {
        Self { project_dir }
    }
}

#[async_trait]
impl Plugin for SummarySaverPlugin {
    fn name(&self) -> &'static str {
        "summary-saver"
    }

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError> {
        let HostEvent::SessionCompacted { session_id, summary } = event else {
            return Ok(());
        };
        let Some(summary) = summary.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        let Some(session_id) = session_id else {
            debug!("Compaction summary without session, not saved");
            return Ok(());
        };

        let path = save_session_summary(&self.project_dir, session_id, summary)?;
        info!(session_id = %session_id, path = %path.display(), "Saved session summary");
        Ok(())
    }
}
