//! Handoff Plugin
//!
//! Handles the `/handoff [note]` command: summarizes the session into a
//! handoff document and queues `/pickup <file>` for the next session.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Plugin, PluginError};
use crate::handoff::{create_handoff, HandoffError, HandoffRequest};
use crate::host::{HostApi, HostEvent, MessageQuery, ToastVariant};
use crate::process::{CommandRunner, CommandSpec};
use crate::transcript::message::keep_recent;
use crate::transcript::{CompactorConfig, Message, MAX_TRANSCRIPT_MESSAGES};

pub const HANDOFF_COMMAND: &str = "handoff";
const TOAST_TITLE: &str = "Handoff";

pub struct HandoffPlugin {
    host: Arc<dyn HostApi>,
    runner: Arc<dyn CommandRunner>,
    summary_command: CommandSpec,
    compactor: CompactorConfig,
    project_dir: PathBuf,
}

impl HandoffPlugin {
    pub fn new(
        host: Arc<dyn HostApi>,
        runner: Arc<dyn CommandRunner>,
        summary_command: CommandSpec,
        compactor: CompactorConfig,
        project_dir: PathBuf,
    ) -> Self {
        Self {
            host,
            runner,
            summary_command,
            compactor,
            project_dir,
        }
    }

    async fn toast(&self, message: &str, variant: ToastVariant) {
        if let Err(e) = self.host.show_toast(TOAST_TITLE, message, variant).await {
            warn!(error = %e, "Failed to show toast");
        }
    }

    /// Fetch the recent transcript as compactable messages.
    async fn transcript(&self, session_id: &str) -> Result<Vec<Message>, PluginError> {
        let query = MessageQuery {
            limit: Some(MAX_TRANSCRIPT_MESSAGES),
            directory: Some(self.project_dir.to_string_lossy().into_owned()),
        };
        let messages = self.host.messages(session_id, &query).await?;
        Ok(keep_recent(messages.iter().filter_map(|m| m.to_message()).collect()))
    }

    /// Create a handoff for `session_id`. Always yields a one-line outcome.
    pub async fn run(&self, session_id: &str, arguments: &str) -> String {
        let note = Some(arguments.trim()).filter(|n| !n.is_empty());

        let messages = match self.transcript(session_id).await {
            Ok(messages) => messages,
            Err(e) => {
                let line = format!("Failed to read session: {}", e);
                self.toast(&line, ToastVariant::Error).await;
                return line;
            }
        };
        let todos = self.host.todos(session_id).await.unwrap_or_else(|e| {
            warn!(session_id = %session_id, error = %e, "Todo lookup failed");
            Vec::new()
        });

        let request = HandoffRequest {
            project_dir: &self.project_dir,
            messages: &messages,
            todos: &todos,
            note,
        };
        match create_handoff(&request, self.runner.as_ref(), &self.summary_command, &self.compactor).await {
            Ok(record) => {
                info!(session_id = %session_id, path = %record.path.display(), "Handoff saved");
                let saved = format!("Handoff saved: {}", record.file_name);
                let pickup = record.pickup_command();
                let (_, appended) = futures::join!(
                    self.toast(&saved, ToastVariant::Success),
                    self.host.append_prompt(&pickup)
                );
                if let Err(e) = appended {
                    warn!(error = %e, "Failed to queue pickup command");
                }
                format!("Handoff saved to {}", record.path.display())
            }
            Err(HandoffError::EmptyTranscript) => {
                let line = HandoffError::EmptyTranscript.to_string();
                self.toast(&line, ToastVariant::Warning).await;
                line
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Handoff failed");
                let line = e.to_string();
                self.toast(&line, ToastVariant::Error).await;
                line
            }
        }
    }
}

#[async_trait]
impl Plugin for HandoffPlugin {
    fn name(&self) -> &'static str {
        "handoff"
    }

    async fn handle(&self, event: &HostEvent) -> Result<(), PluginError> {
        let HostEvent::CommandExecuted {
            session_id,
            name,
            arguments,
            message_id,
        } = event
        else {
            return Ok(());
        };
        if name != HANDOFF_COMMAND {
            return Ok(());
        }

        let outcome = self.run(session_id, arguments).await;
        info!(session_id = %session_id, outcome = %outcome, "Handoff command finished");

        // Keep the agent from answering the command itself
        if let Some(message_id) = message_id {
            self.host.revert(session_id, message_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::default_summary_command;
    use crate::host::testing::{host_message, HostCall, RecordingHost};
    use crate::process::testing::ScriptedRunner;
    use crate::transcript::{Todo, TodoStatus};

    fn command(message_id: Option<&str>) -> HostEvent {
        HostEvent::CommandExecuted {
            session_id: "ses_1".into(),
            name: HANDOFF_COMMAND.into(),
            arguments: "  check the flaky test  ".into(),
            message_id: message_id.map(str::to_string),
        }
    }

    fn plugin(host: &Arc<RecordingHost>, runner: &Arc<ScriptedRunner>, dir: &std::path::Path) -> HandoffPlugin {
        HandoffPlugin::new(
            host.clone(),
            runner.clone(),
            default_summary_command(),
            CompactorConfig::default(),
            dir.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn test_handoff_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(
            RecordingHost::new()
                .with_messages(vec![
                    host_message("m1", "user", "add retries to the uploader"),
                    host_message("m2", "assistant", "Added exponential backoff to upload()."),
                ])
                .with_todos(vec![Todo::new("Write tests", TodoStatus::Pending)]),
        );
        let runner = Arc::new(ScriptedRunner::new().ok("Title: Uploader Retries\n\nAdded backoff."));

        plugin(&host, &runner, dir.path()).handle(&command(Some("m3"))).await.unwrap();

        let stdin = runner.requests()[0].stdin.clone().unwrap();
        assert!(stdin.contains("USER: add retries to the uploader"));
        assert!(stdin.contains("□ Write tests"));

        let calls = host.calls();
        assert!(calls.contains(&HostCall::Messages {
            session_id: "ses_1".into(),
            limit: Some(MAX_TRANSCRIPT_MESSAGES),
        }));
        let appended: Vec<&String> = calls
            .iter()
            .filter_map(|c| match c {
                HostCall::AppendPrompt(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(appended.len(), 1);
        assert!(appended[0].starts_with("/pickup uploader-retries-"));
        assert_eq!(host.toasts()[0].1, ToastVariant::Success);
        assert_eq!(
            calls.last(),
            Some(&HostCall::Revert {
                session_id: "ses_1".into(),
                message_id: "m3".into(),
            })
        );

        let files: Vec<_> = std::fs::read_dir(dir.path().join(".claude/handoffs")).unwrap().collect();
        assert_eq!(files.len(), 1);
        let content = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert!(content.contains("> check the flaky test"));
    }

    #[tokio::test]
    async fn test_empty_transcript_warns() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::new());
        let runner = Arc::new(ScriptedRunner::new());

        let outcome = plugin(&host, &runner, dir.path()).run("ses_1", "").await;
        assert_eq!(outcome, "No conversation history found to summarize.");
        assert_eq!(
            host.toasts(),
            vec![(outcome.clone(), ToastVariant::Warning)]
        );
        assert!(runner.requests().is_empty());
    }

    #[tokio::test]
    async fn test_summary_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::new().with_messages(vec![host_message("m1", "user", "hello there")]));
        let runner = Arc::new(ScriptedRunner::new().exit(1, "partial", ""));

        let outcome = plugin(&host, &runner, dir.path()).run("ses_1", "").await;
        assert!(outcome.contains("partial"));
        assert_eq!(host.toasts()[0].1, ToastVariant::Error);
        assert!(!host.calls().iter().any(|c| matches!(c, HostCall::AppendPrompt(_))));
    }

    fn revert_m3() -> HostCall {
        HostCall::Revert {
            session_id: "ses_1".into(),
            message_id: "m3".into(),
        }
    }

    #[tokio::test]
    async fn test_transcript_failure_still_reverts() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(
            RecordingHost::new()
                .with_messages(vec![host_message("m1", "user", "hello there")])
                .failing("messages"),
        );
        let runner = Arc::new(ScriptedRunner::new());
        let handoff = plugin(&host, &runner, dir.path());

        let outcome = handoff.run("ses_1", "").await;
        assert!(outcome.starts_with("Failed to read session:"));
        assert!(outcome.contains("messages unavailable"));
        assert_eq!(host.toasts(), vec![(outcome.clone(), ToastVariant::Error)]);
        assert!(runner.requests().is_empty());

        handoff.handle(&command(Some("m3"))).await.unwrap();
        assert_eq!(host.calls().last(), Some(&revert_m3()));
        assert!(!dir.path().join(".claude/handoffs").exists());
    }

    #[tokio::test]
    async fn test_pickup_queue_failure_keeps_handoff() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(
            RecordingHost::new()
                .with_messages(vec![host_message("m1", "user", "rename the config loader")])
                .failing("append_prompt"),
        );
        let runner = Arc::new(ScriptedRunner::new().ok("Title: Config Loader\n\nRenamed."));
        let handoff = plugin(&host, &runner, dir.path());

        let outcome = handoff.run("ses_1", "").await;
        assert!(outcome.starts_with("Handoff saved to .claude/handoffs/config-loader-"));
        let toasts = host.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].1, ToastVariant::Success);
        assert!(host.calls().iter().any(|c| matches!(c, HostCall::AppendPrompt(_))));

        let runner = Arc::new(ScriptedRunner::new().ok("Title: Config Loader\n\nRenamed."));
        plugin(&host, &runner, dir.path()).handle(&command(Some("m3"))).await.unwrap();
        assert_eq!(host.calls().last(), Some(&revert_m3()));
    }

    #[tokio::test]
    async fn test_todo_failure_degrades_to_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(
            RecordingHost::new()
                .with_messages(vec![host_message("m1", "user", "bump the lockfile")])
                .with_todos(vec![Todo::new("Never listed", TodoStatus::Pending)])
                .failing("todos"),
        );
        let runner = Arc::new(ScriptedRunner::new().ok("Title: Lockfile Bump\n\nDone."));

        plugin(&host, &runner, dir.path()).handle(&command(Some("m3"))).await.unwrap();

        let stdin = runner.requests()[0].stdin.clone().unwrap();
        assert!(!stdin.contains("# Current Todo List (from session)"));
        assert!(!stdin.contains("Never listed"));
        assert_eq!(host.toasts()[0].1, ToastVariant::Success);
        assert!(host.calls().contains(&HostCall::Todos("ses_1".into())));
        assert_eq!(host.calls().last(), Some(&revert_m3()));
    }

    #[tokio::test]
    async fn test_other_commands_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost::new());
        let runner = Arc::new(ScriptedRunner::new());
        let event = HostEvent::CommandExecuted {
            session_id: "s".into(),
            name: "pickup".into(),
            arguments: String::new(),
            message_id: Some("m".into()),
        };
        plugin(&host, &runner, dir.path()).handle(&event).await.unwrap();
        assert!(host.calls().is_empty());
    }
}
