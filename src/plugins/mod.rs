//! Plugins Module
//!
//! Each plugin reacts to host lifecycle events with a small side effect. The
//! `PluginHost` fans every event out to all plugins and waits for them.

pub mod continuity;
pub mod handoff;
pub mod notify;
pub mod pickup;
pub mod retry;
pub mod review;
pub mod summary_saver;
pub mod system_prompt;

use async_trait::async_trait;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::handoff::{HandoffError, StoreError};
use crate::host::{HostApi, HostError, HostEvent};
use crate::process::{CommandRunner, ProcessError};

pub use continuity::ContinuityPlugin;
pub use handoff::HandoffPlugin;
pub use notify::NotifyPlugin;
pub use pickup::PickupPlugin;
pub use retry::{should_retry, RetryPlugin, RETRYABLE_ERRORS, RETRY_PROMPT};
pub use review::ReviewTool;
pub use summary_saver::SummarySaverPlugin;
pub use system_prompt::SystemPromptPlugin;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Host error: {0}")]
    Host(#[from] HostError),
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Handoff error: {0}")]
    Handoff(#[from] HandoffError),
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError>;
}

/// Outcome of one dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: usize,
    pub failed: Vec<&'static str>,
}

#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Run every plugin for `event` concurrently. Failures are logged and
    /// reported, never propagated.
    pub async fn dispatch(&self, event: &HostEvent) -> DispatchReport {
        debug!(event = %event.kind(), plugins = self.plugins.len(), "Dispatching event");

        let results = join_all(self.plugins.iter().map(|p| async move { (p.name(), p.handle(event).await) })).await;

        let mut report = DispatchReport::default();
        for (name, result) in results {
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    warn!(plugin = name, event = %event.kind(), error = %e, "Plugin failed");
                    report.failed.push(name);
                }
            }
        }
        report
    }
}

/// The full plugin set for a project
pub fn default_plugins(
    config: &Config,
    host: Arc<dyn HostApi>,
    runner: Arc<dyn CommandRunner>,
) -> PluginHost {
    let project_dir: PathBuf = config.project_dir();
    let mut plugins = PluginHost::new();

    plugins.register(ContinuityPlugin::new(host.clone(), project_dir.clone()));
    plugins.register(PickupPlugin::new(host.clone(), project_dir.clone()));
    plugins.register(SummarySaverPlugin::new(project_dir.clone()));
    plugins.register(SystemPromptPlugin::new(host.clone(), config.system_prompt.clone()));
    if config.notifier.enabled {
        plugins.register(NotifyPlugin::new(
            host.clone(),
            runner.clone(),
            config.notifier.clone(),
            project_dir.clone(),
        ));
    }
    plugins.register(RetryPlugin::new(host.clone()));
    plugins.register(HandoffPlugin::new(
        host,
        runner,
        config.summary_command.clone(),
        config.compactor,
        project_dir,
    ));
    plugins
}
