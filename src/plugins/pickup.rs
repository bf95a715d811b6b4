//! Pending Handoff Pickup
//!
//! When a session starts and `.claude/handoffs` holds handoffs that were
//! never picked up, tell the agent to resume from the newest one as soon as
//! the user nudges it.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Plugin, PluginError};
use crate::handoff::{pending_handoffs, pickup_command, HandoffEntry};
use crate::host::{HostApi, HostEvent, PromptRequest, ToastVariant};

const TOAST_TITLE: &str = "Handoff";

pub struct PickupPlugin {
    host: Arc<dyn HostApi>,
    project_dir: PathBuf,
}

impl PickupPlugin {
    pub fn new(host: Arc<dyn HostApi>, project_dir: PathBuf) -> Self {
        Self { host, project_dir }
    }
}

fn older_line(pending: &[HandoffEntry]) -> Option<String> {
    let older = pending.len().saturating_sub(1);
    (older > 0).then(|| format!("({} older handoff(s) also available)", older))
}

/// Context block for the newest pending handoff. `pending` must be sorted
/// newest first; None when it is empty.
pub fn pickup_block(pending: &[HandoffEntry]) -> Option<String> {
    let latest = pending.first()?;
    let mut lines = vec![
        "## AUTO-PICKUP TRIGGER".to_string(),
        String::new(),
        "When the user sends a single '.' or 'start' or 'go', immediately run:".to_string(),
        "```".to_string(),
        pickup_command(&latest.name),
        "```".to_string(),
        "Do not ask questions or explain first. Just run that command.".to_string(),
        String::new(),
        format!("Pending handoff: `{}`", latest.name),
    ];
    lines.extend(older_line(pending));
    Some(lines.join("\n"))
}

/// One-line notice shown to the user alongside the context block
pub fn pickup_notice(pending: &[HandoffEntry]) -> Option<String> {
    let latest = pending.first()?;
    let mut notice = format!(
        "Pending handoff: {} (created {}). Run `{}` to continue.",
        latest.name,
        latest.modified.format("%Y-%m-%d %H:%M:%S"),
        pickup_command(&latest.name)
    );
    if let Some(older) = older_line(pending) {
        notice.push(' ');
        notice.push_str(&older);
    }
    Some(notice)
}

#[async_trait]
impl Plugin for PickupPlugin {
    fn name(&self) -> &'static str {
        "pickup"
    }

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError> {
        let HostEvent::SessionCreated { session_id } = event else {
            return Ok(());
        };
        let pending = pending_handoffs(&self.project_dir)?;
        let (Some(block), Some(notice)) = (pickup_block(&pending), pickup_notice(&pending)) else {
            return Ok(());
        };

        info!(session_id = %session_id, handoff = %pending[0].name, pending = pending.len(), "Pending handoff found");
        self.host.prompt(session_id, &PromptRequest::context(block)).await?;
        if let Err(e) = self.host.show_toast(TOAST_TITLE, &notice, ToastVariant::Info).await {
            warn!(error = %e, "Failed to show toast");
        }
        Ok(())
    }
}
