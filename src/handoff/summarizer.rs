//! External summary command
//!
//! The prompt is piped to the command's stdin; trimmed stdout is the summary.

use std::path::Path;

use tracing::{debug, warn};

use crate::process::{snippet, CommandRunner, CommandSpec, ProcessError};

/// Default summary command: `aichat -r session-summary`
pub fn default_summary_command() -> CommandSpec {
    CommandSpec::new("aichat", &["-r", "session-summary"])
}

pub struct Summarizer<'a> {
    runner: &'a dyn CommandRunner,
    command: &'a CommandSpec,
}

impl<'a> Summarizer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, command: &'a CommandSpec) -> Self {
        Self { runner, command }
    }

    /// Run the summary command in `cwd`. Non-zero exit or blank output is an
    /// error carrying whatever the command printed.
    pub async fn summarize(&self, prompt: &str, cwd: &Path) -> Result<String, ProcessError> {
        let request = self
            .command
            .request(Vec::new())
            .with_stdin(prompt)
            .with_cwd(cwd);

        debug!(program = %self.command.program, prompt_chars = prompt.chars().count(), "Requesting summary");
        let output = self.runner.run(&request).await?.check(&self.command.program)?;

        let summary = output.stdout.trim();
        if summary.is_empty() {
            warn!(program = %self.command.program, "Summary command printed nothing");
            return Err(ProcessError::EmptyOutput {
                program: self.command.program.clone(),
                stderr: snippet(&output.stderr),
            });
        }
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;

    #[tokio::test]
    async fn test_summary_is_trimmed_stdout() {
        let runner = ScriptedRunner::new().ok("\n  Title: Done\nbody  \n");
        let command = default_summary_command();
        let summary = Summarizer::new(&runner, &command)
            .summarize("prompt text", Path::new("/proj"))
            .await
            .unwrap();
        assert_eq!(summary, "Title: Done\nbody");

        let requests = runner.requests();
        assert_eq!(requests[0].program, "aichat");
        assert_eq!(requests[0].args, vec!["-r", "session-summary"]);
        assert_eq!(requests[0].stdin.as_deref(), Some("prompt text"));
        assert_eq!(requests[0].cwd.as_deref(), Some(Path::new("/proj")));
    }

    #[tokio::test]
    async fn test_failure_includes_partial_output() {
        let runner = ScriptedRunner::new().exit(1, "half a summary", "");
        let command = default_summary_command();
        let err = Summarizer::new(&runner, &command)
            .summarize("p", Path::new("."))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("half a summary"));
    }

    #[tokio::test]
    async fn test_failure_keeps_stdout_alongside_stderr() {
        let runner = ScriptedRunner::new().exit(1, "Title: Half\n## Session Overview\npartial body", "rate limited");
        let command = default_summary_command();
        let err = Summarizer::new(&runner, &command)
            .summarize("p", Path::new("."))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("rate limited"));
        assert!(message.contains("partial body"));
    }

    #[tokio::test]
    async fn test_blank_output_is_error() {
        let runner = ScriptedRunner::new().exit(0, "   ", "model unavailable");
        let command = default_summary_command();
        let err = Summarizer::new(&runner, &command)
            .summarize("p", Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::EmptyOutput { .. }));
        assert!(err.to_string().contains("model unavailable"));
    }
}
