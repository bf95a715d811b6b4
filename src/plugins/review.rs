//! Review tool: hands instructions plus conversation context to an external
//! reviewer and returns what it printed.

use std::sync::Arc;
use tracing::debug;

use crate::process::{CommandRunner, CommandSpec, ProcessError};

pub fn review_prompt(instructions: &str, context: &str) -> String {
    format!("{}\n\nContext:\n{}", instructions, context)
}

pub struct ReviewTool {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
}

impl ReviewTool {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec) -> Self {
        Self { runner, command }
    }

    /// Run the reviewer with the prompt as its last argument.
    pub async fn execute(&self, instructions: &str, context: &str) -> Result<String, ProcessError> {
        let prompt = review_prompt(instructions, context);
        debug!(program = %self.command.program, prompt_chars = prompt.chars().count(), "Running review");

        let request = self.command.request([prompt]);
        let output = self.runner.run(&request).await?.check(&self.command.program)?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;

    #[tokio::test]
    async fn test_prompt_is_last_argument() {
        let runner = Arc::new(ScriptedRunner::new().ok("LGTM\n"));
        let tool = ReviewTool::new(runner.clone(), CommandSpec::new("reviewer", &["--profile", "review"]));

        let out = tool.execute("Check error handling", "USER: add retries").await.unwrap();
        assert_eq!(out, "LGTM\n");

        let requests = runner.requests();
        assert_eq!(
            requests[0].args,
            vec![
                "--profile",
                "review",
                "Check error handling\n\nContext:\nUSER: add retries"
            ]
        );
        assert!(requests[0].stdin.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_error() {
        let runner = Arc::new(ScriptedRunner::new().exit(2, "", "not logged in"));
        let tool = ReviewTool::new(runner, CommandSpec::new("reviewer", &[]));
        let err = tool.execute("i", "c").await.unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }
}
