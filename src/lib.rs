// Continuity Library
// Exports core modules for use by the plugin runner and the CLI binaries

pub mod config;
pub mod github;
pub mod handoff;
pub mod host;
pub mod plugins;
pub mod process;
pub mod transcript;

// Re-export commonly used types for the binaries
pub use config::{Config, ConfigError, NotifierConfig};

pub use transcript::{
    compact, compact_with, parse_transcript, read_transcript, CompactionStats, CompactorConfig, Message,
    Role, Todo, TodoStatus, Transcript,
};

pub use handoff::{
    create_handoff, list_handoffs, mark_handled, read_handoff, HandoffEntry, HandoffError, HandoffRecord,
    HandoffRequest,
};

pub use host::{HostApi, HostError, HostEvent, HttpHostClient};

pub use plugins::{default_plugins, Plugin, PluginError, PluginHost, ReviewTool};

pub use process::{CommandRunner, CommandSpec, ProcessError, TokioCommandRunner};

pub use github::{delete_notification, fetch_notifications, ClearReport, GhError, Notification};
