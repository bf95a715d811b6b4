//! GitHub Notifications
//!
//! Fetch and delete notification threads through the `gh` CLI. Used by the
//! `clear-gh-notifications` binary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::process::{CommandRequest, CommandRunner, ProcessError};

pub const GH_PROGRAM: &str = "gh";
/// Characters of unparseable output quoted in errors
const PREVIEW_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum GhError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Invalid JSON response: {message}\nOutput: {preview}")]
    InvalidJson { message: String, preview: String },
    #[error("Expected array but got: {0}")]
    NotAnArray(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub subject: Subject,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode `gh api notifications` output. Blank output means none.
pub fn parse_notifications(output: &str) -> Result<Vec<Notification>, GhError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let invalid = |e: serde_json::Error| GhError::InvalidJson {
        message: e.to_string(),
        preview: trimmed.chars().take(PREVIEW_CHARS).collect(),
    };

    let value: Value = serde_json::from_str(trimmed).map_err(invalid)?;
    if !value.is_array() {
        return Err(GhError::NotAnArray(json_type(&value)));
    }
    serde_json::from_value(value).map_err(invalid)
}

pub async fn fetch_notifications(runner: &dyn CommandRunner) -> Result<Vec<Notification>, GhError> {
    let request = CommandRequest::new(GH_PROGRAM, &["api", "notifications"]);
    let output = runner.run(&request).await?.check(GH_PROGRAM)?;
    let notifications = parse_notifications(&output.stdout)?;
    debug!(count = notifications.len(), "Fetched notifications");
    Ok(notifications)
}

/// Delete one thread. Spawn failures and non-zero exits count as `false`;
/// a dry run deletes nothing and reports success.
pub async fn delete_notification(runner: &dyn CommandRunner, thread_id: &str, dry_run: bool) -> bool {
    if dry_run {
        return true;
    }
    let path = format!("notifications/threads/{}", thread_id);
    let request = CommandRequest::new(GH_PROGRAM, &["api", "--method", "DELETE", path.as_str()]);
    match runner.run(&request).await {
        Ok(output) => output.success(),
        Err(e) => {
            warn!(thread_id = %thread_id, error = %e, "Failed to run gh");
            false
        }
    }
}

/// Running tally of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub deleted: usize,
    pub failed: usize,
}

impl ClearReport {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.deleted += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;

    const SAMPLE: &str = r#"[
        {"id":"101","subject":{"title":"Bump tokio","type":"PullRequest","url":null},
         "repository":{"id":1,"name":"continuity","full_name":"me/continuity","owner":{"login":"me"}},
         "reason":"review_requested","unread":true,"updated_at":"2026-10-01T10:00:00Z"},
        {"id":"102","subject":{"title":"Ghost thread"},"repository":{"full_name":"org/gone"}}
    ]"#;

    #[test]
    fn test_parse_notifications() {
        let notifications = parse_notifications(SAMPLE).unwrap();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].subject.title, "Bump tokio");
        assert_eq!(notifications[0].repository.full_name, "me/continuity");
        assert_eq!(notifications[1].id, "102");
        assert!(!notifications[1].unread);
    }

    #[test]
    fn test_parse_blank_and_invalid() {
        assert!(parse_notifications("  \n").unwrap().is_empty());
        assert!(matches!(parse_notifications(r#"{"message":"Bad credentials"}"#), Err(GhError::NotAnArray("object"))));

        let long = format!("<html>{}", "x".repeat(500));
        match parse_notifications(&long) {
            Err(GhError::InvalidJson { preview, .. }) => assert_eq!(preview.chars().count(), 200),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_carries_stderr() {
        let runner = ScriptedRunner::new().exit(4, "", "gh: To get started, run: gh auth login");
        let err = fetch_notifications(&runner).await.unwrap_err();
        assert!(err.to_string().contains("gh auth login"));
        assert_eq!(runner.requests()[0].args, vec!["api", "notifications"]);
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let runner = ScriptedRunner::new().ok("").exit(1, "", "404").missing();
        assert!(delete_notification(&runner, "101", false).await);
        assert!(!delete_notification(&runner, "102", false).await);
        assert!(!delete_notification(&runner, "103", false).await);
        assert_eq!(
            runner.requests()[0].args,
            vec!["api", "--method", "DELETE", "notifications/threads/101"]
        );
    }

    #[tokio::test]
    async fn test_dry_run_spawns_nothing() {
        let runner = ScriptedRunner::new();
        assert!(delete_notification(&runner, "101", true).await);
        assert!(runner.requests().is_empty());
    }

    #[test]
    fn test_report_tally() {
        let mut report = ClearReport::default();
        for ok in [true, false, true] {
            report.record(ok);
        }
        assert_eq!(report, ClearReport { deleted: 2, failed: 1 });
    }
}
