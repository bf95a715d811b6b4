//! Configuration
//!
//! Defaults, an optional JSON file, then environment overrides. The result is
//! passed explicitly into the plugins; nothing reads the environment later.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::handoff::default_summary_command;
use crate::process::CommandSpec;
use crate::transcript::CompactorConfig;

const APP_DIR: &str = "continuity";
const CONFIG_FILE_NAME: &str = "config.json";

pub const ENV_HOST_URL: &str = "CONTINUITY_HOST_URL";
pub const ENV_PROJECT_DIR: &str = "CONTINUITY_PROJECT_DIR";
pub const ENV_SYSTEM_PROMPT: &str = "CONTINUITY_SYSTEM_PROMPT";
pub const ENV_SUMMARY_COMMAND: &str = "CONTINUITY_SUMMARY_COMMAND";

pub const DEFAULT_HOST_URL: &str = "http://127.0.0.1:4096";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid command line in {0}")]
    InvalidCommand(&'static str),
}

/// Desktop notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotifierConfig {
    pub enabled: bool,
    pub program: String,
    pub title: String,
    /// Application brought to the front when the notification is clicked
    pub terminal_app: String,
    /// tmux window selected in the project's session on click
    pub tmux_window: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "terminal-notifier".to_string(),
            title: "opencode".to_string(),
            terminal_app: "Ghostty".to_string(),
            tmux_window: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub host_url: String,
    /// Project root; the current directory when unset
    pub project_dir: Option<PathBuf>,
    pub system_prompt: Option<String>,
    pub summary_command: CommandSpec,
    pub review_command: CommandSpec,
    pub notifier: NotifierConfig,
    pub compactor: CompactorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_url: DEFAULT_HOST_URL.to_string(),
            project_dir: None,
            system_prompt: None,
            summary_command: default_summary_command(),
            review_command: CommandSpec::new("claude-lifeguard", &[]),
            notifier: NotifierConfig::default(),
            compactor: CompactorConfig::default(),
        }
    }
}

/// `$CONFIG_DIR/continuity/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

impl Config {
    /// Read a config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an explicit path, else the default location if it exists,
    /// else defaults; then apply the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "Loading config");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_HOST_URL) {
            self.host_url = url;
        }
        if let Some(dir) = get(ENV_PROJECT_DIR) {
            self.project_dir = Some(PathBuf::from(dir));
        }
        if let Some(prompt) = get(ENV_SYSTEM_PROMPT) {
            self.system_prompt = Some(prompt);
        }
        if let Some(line) = get(ENV_SUMMARY_COMMAND) {
            self.summary_command =
                CommandSpec::parse(&line).ok_or(ConfigError::InvalidCommand(ENV_SUMMARY_COMMAND))?;
        }
        Ok(())
    }

    /// Configured project directory, falling back to the working directory
    pub fn project_dir(&self) -> PathBuf {
        self.project_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
