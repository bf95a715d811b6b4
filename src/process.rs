//! Subprocess boundary
//!
//! Every external tool (summarizer, notifier, review command, `gh`) is run
//! through a `CommandRunner` so handlers can be exercised without spawning.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Output snippets attached to errors are capped at this many characters
const OUTPUT_SNIPPET_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {code}: {}", join_streams(.stderr, .stdout))]
    Failed {
        program: String,
        code: String,
        stdout: String,
        stderr: String,
    },
    #[error("{program} produced no output: {stderr}")]
    EmptyOutput { program: String, stderr: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A program plus its fixed leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Split a whitespace separated command line. Returns None when blank.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?.to_string();
        Some(Self {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Build a request with extra trailing arguments
    pub fn request(&self, extra: impl IntoIterator<Item = String>) -> CommandRequest {
        let mut args = self.args.clone();
        args.extend(extra);
        CommandRequest {
            program: self.program.clone(),
            args,
            stdin: None,
            cwd: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandRequest {
    pub fn new(program: &str, args: &[&str]) -> Self {
        CommandSpec::new(program, args).request(Vec::new())
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// None when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into `ProcessError::Failed`
    pub fn check(self, program: &str) -> Result<Self, ProcessError> {
        if self.success() {
            return Ok(self);
        }
        Err(ProcessError::Failed {
            program: program.to_string(),
            code: self
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stdout: snippet(&self.stdout),
            stderr: snippet(&self.stderr),
        })
    }
}

/// Stderr then stdout, skipping whichever is empty
fn join_streams(stderr: &str, stdout: &str) -> String {
    match (stderr.is_empty(), stdout.is_empty()) {
        (false, false) => format!("{}\n{}", stderr, stdout),
        (false, true) => stderr.to_string(),
        (true, _) => stdout.to_string(),
    }
}

/// First `OUTPUT_SNIPPET_CHARS` characters of trimmed output
pub fn snippet(text: &str) -> String {
    text.trim().chars().take(OUTPUT_SNIPPET_CHARS).collect()
}

/// Runs external commands to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Spawn failures are errors; a non-zero exit is reported in the output.
    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, ProcessError>;
}

/// `CommandRunner` backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
        debug!(program = %request.program, args = ?request.args, "Spawning command");

        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .stdin(if request.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref cwd) = request.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: request.program.clone(),
            source,
        })?;

        if let Some(ref input) = request.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
                // Dropping closes the pipe so the child sees EOF
                drop(stdin);
            }
        }

        let output = child.wait_with_output().await?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted `CommandRunner` recording every request

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct ScriptedRunner {
        requests: Mutex<Vec<CommandRequest>>,
        responses: Mutex<VecDeque<Result<CommandOutput, String>>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful run printing `stdout`
        pub fn ok(self, stdout: &str) -> Self {
            self.responses.lock().push_back(Ok(CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }));
            self
        }

        pub fn exit(self, code: i32, stdout: &str, stderr: &str) -> Self {
            self.responses.lock().push_back(Ok(CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }));
            self
        }

        /// Queue a spawn failure
        pub fn missing(self) -> Self {
            self.responses.lock().push_back(Err("not found".to_string()));
            self
        }

        pub fn requests(&self) -> Vec<CommandRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
            self.requests.lock().push(request.clone());
            // Unscripted runs succeed silently
            match self.responses.lock().pop_front() {
                Some(Ok(output)) => Ok(output),
                Some(Err(msg)) => Err(ProcessError::Spawn {
                    program: request.program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, msg),
                }),
                None => Ok(CommandOutput {
                    code: Some(0),
                    ..Default::default()
                }),
            }
        }
    }
}
