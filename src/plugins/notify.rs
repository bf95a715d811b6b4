//! Notify Plugin
//!
//! Desktop notification when a session goes idle. Clicking the notification
//! focuses the terminal and switches tmux to the project's session.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Plugin, PluginError};
use crate::config::NotifierConfig;
use crate::host::{HostApi, HostEvent, SessionInfo};
use crate::process::{CommandRequest, CommandRunner};

pub const RUN_COMPLETE: &str = "Agent run complete";

/// `(category, project)`: the last two components of the project path
pub fn project_labels(project_dir: &Path) -> (String, String) {
    let parts: Vec<String> = project_dir
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let project = parts.last().cloned().unwrap_or_default();
    let category = parts.iter().rev().nth(1).cloned().unwrap_or_default();
    (category, project)
}

/// Escaped brackets, since terminal-notifier treats a leading `[` specially
pub fn subtitle(category: &str, project: &str) -> String {
    format!("\\[{}/{}]", category, project)
}

/// The session title, unless it is missing or still the host's default
pub fn notification_message(session: Option<&SessionInfo>) -> String {
    match session {
        Some(s) if s.has_custom_title() => s.title.clone(),
        _ => RUN_COMPLETE.to_string(),
    }
}

/// Shell command run on click
pub fn focus_script(terminal_app: &str, project: &str, tmux_window: u32) -> String {
    [
        format!("osascript -e 'tell application \"{}\" to activate'", terminal_app),
        "-e 'tell application \"System Events\" to key code 49 using control down'".to_string(),
        "-e 'tell application \"System Events\" to keystroke \":\"'".to_string(),
        "-e 'delay 0.1'".to_string(),
        format!(
            "-e 'tell application \"System Events\" to keystroke \"switch-client -t {}:{}\"'",
            project, tmux_window
        ),
        "-e 'tell application \"System Events\" to key code 36'".to_string(),
    ]
    .join(" ")
}

pub struct NotifyPlugin {
    host: Arc<dyn HostApi>,
    runner: Arc<dyn CommandRunner>,
    config: NotifierConfig,
    project_dir: PathBuf,
}

impl NotifyPlugin {
    pub fn new(
        host: Arc<dyn HostApi>,
        runner: Arc<dyn CommandRunner>,
        config: NotifierConfig,
        project_dir: PathBuf,
    ) -> Self {
        Self {
            host,
            runner,
            config,
            project_dir,
        }
    }

    pub fn notifier_request(&self, session_id: &str, message: &str) -> CommandRequest {
        let (category, project) = project_labels(&self.project_dir);
        let args = vec![
            "-title".to_string(),
            self.config.title.clone(),
            "-subtitle".to_string(),
            subtitle(&category, &project),
            "-message".to_string(),
            message.to_string(),
            "-group".to_string(),
            format!("{}-{}-{}", self.config.title, project, session_id),
            "-execute".to_string(),
            focus_script(&self.config.terminal_app, &project, self.config.tmux_window),
        ];
        CommandRequest {
            program: self.config.program.clone(),
            args,
            stdin: None,
            cwd: None,
        }
    }
}

#[async_trait]
impl Plugin for NotifyPlugin {
    fn name(&self) -> &'static str {
        "notify"
    }

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError> {
        let HostEvent::SessionIdle { session_id } = event else {
            return Ok(());
        };

        let session = match self.host.session(session_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Session lookup failed, using default message");
                None
            }
        };
        let message = notification_message(session.as_ref());

        debug!(session_id = %session_id, message = %message, "Sending idle notification");
        let request = self.notifier_request(session_id, &message);
        self.runner.run(&request).await?.check(&self.config.program)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::RecordingHost;
    use crate::process::testing::ScriptedRunner;
    use crate::process::ProcessError;

    fn plugin(host: Arc<RecordingHost>, runner: Arc<ScriptedRunner>) -> NotifyPlugin {
        NotifyPlugin::new(
            host,
            runner,
            NotifierConfig::default(),
            PathBuf::from("/Users/me/work/continuity"),
        )
    }

    #[test]
    fn test_project_labels() {
        assert_eq!(
            project_labels(Path::new("/Users/me/work/continuity/")),
            ("work".to_string(), "continuity".to_string())
        );
        assert_eq!(project_labels(Path::new("/solo")), (String::new(), "solo".to_string()));
        assert_eq!(subtitle("work", "continuity"), "\\[work/continuity]");
    }

    #[test]
    fn test_message_falls_back_for_default_titles() {
        let mut info = SessionInfo {
            id: "s".into(),
            title: "New session - 2026-10-15T10:00:00".into(),
            directory: None,
        };
        assert_eq!(notification_message(Some(&info)), RUN_COMPLETE);
        assert_eq!(notification_message(None), RUN_COMPLETE);
        info.title = "Fix pagination".into();
        assert_eq!(notification_message(Some(&info)), "Fix pagination");
    }

    #[test]
    fn test_focus_script_targets_project_window() {
        let script = focus_script("Ghostty", "continuity", 3);
        assert!(script.starts_with("osascript -e 'tell application \"Ghostty\" to activate'"));
        assert!(script.contains("switch-client -t continuity:3"));
    }

    #[tokio::test]
    async fn test_idle_sends_notification() {
        let host = Arc::new(RecordingHost::new().with_session("ses_9", "Fix pagination"));
        let runner = Arc::new(ScriptedRunner::new());
        plugin(host, runner.clone())
            .handle(&HostEvent::SessionIdle { session_id: "ses_9".into() })
            .await
            .unwrap();

        let requests = runner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].program, "terminal-notifier");
        let args = &requests[0].args;
        assert_eq!(args[0..6], ["-title", "opencode", "-subtitle", "\\[work/continuity]", "-message", "Fix pagination"]);
        assert_eq!(args[7], "opencode-continuity-ses_9");
    }

    #[tokio::test]
    async fn test_session_lookup_failure_still_notifies() {
        let host = Arc::new(RecordingHost::new());
        let runner = Arc::new(ScriptedRunner::new());
        plugin(host, runner.clone())
            .handle(&HostEvent::SessionIdle { session_id: "gone".into() })
            .await
            .unwrap();
        assert_eq!(runner.requests()[0].args[5], RUN_COMPLETE);
    }

    #[tokio::test]
    async fn test_missing_notifier_is_error() {
        let host = Arc::new(RecordingHost::new());
        let runner = Arc::new(ScriptedRunner::new().missing());
        let result = plugin(host, runner)
            .handle(&HostEvent::SessionIdle { session_id: "s".into() })
            .await;
        assert!(matches!(result, Err(PluginError::Process(ProcessError::Spawn { .. }))));
    }
}
