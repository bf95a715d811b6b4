//! Handoff Module
//!
//! Turns a session transcript into a markdown handoff document that a new
//! session can pick up: compact, summarize out of process, name, write.

pub mod naming;
pub mod prompt;
pub mod store;
pub mod summarizer;

use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::process::{CommandRunner, CommandSpec, ProcessError};
use crate::transcript::{compact_with, CompactorConfig, Message, Todo};

pub use naming::{extract_title, keyword_slug, name_handoff, slugify, FALLBACK_SLUG};
pub use prompt::{build_summary_prompt, format_conversation, format_todos};
pub use store::{
    latest_session_summary, list_handoffs, mark_handled, pending_handoffs, read_handoff,
    save_handoff, save_session_summary, HandoffDocument, HandoffEntry, StoreError,
};
pub use summarizer::{default_summary_command, Summarizer};

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("No conversation history found to summarize.")]
    EmptyTranscript,
    #[error("Summary generation failed: {0}")]
    Summary(#[from] ProcessError),
    #[error("Error saving handoff: {0}")]
    Store(#[from] StoreError),
}

/// Everything a handoff is built from
pub struct HandoffRequest<'a> {
    pub project_dir: &'a Path,
    pub messages: &'a [Message],
    pub todos: &'a [Todo],
    pub note: Option<&'a str>,
}

/// A written handoff
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    pub title: Option<String>,
    pub slug: String,
    /// Path relative to the project root
    pub path: PathBuf,
    pub file_name: String,
}

/// Command that resumes from the handoff stored as `file_name`
pub fn pickup_command(file_name: &str) -> String {
    format!("/pickup {}", file_name)
}

impl HandoffRecord {
    pub fn pickup_command(&self) -> String {
        pickup_command(&self.file_name)
    }
}

/// Compact, summarize and save a handoff.
pub async fn create_handoff(
    request: &HandoffRequest<'_>,
    runner: &dyn CommandRunner,
    summary_command: &CommandSpec,
    compactor: &CompactorConfig,
) -> Result<HandoffRecord, HandoffError> {
    if request.messages.is_empty() {
        return Err(HandoffError::EmptyTranscript);
    }

    let (compacted, stats) = compact_with(request.messages, compactor);
    tracing::info!(
        messages = stats.input_messages,
        kept = compacted.len(),
        chars = stats.output_chars,
        "Compacted transcript for handoff"
    );

    let prompt = build_summary_prompt(request.project_dir, &compacted, request.todos);
    let summary = Summarizer::new(runner, summary_command)
        .summarize(&prompt, request.project_dir)
        .await?;

    // Naming looks at the full transcript, not the compacted one
    let (title, slug) = name_handoff(&summary, request.messages);
    let doc = HandoffDocument {
        heading: title.as_deref().unwrap_or(&slug),
        slug: &slug,
        summary: &summary,
        note: request.note,
        created: Local::now(),
    };
    let file_name = doc.file_name();
    let path = save_handoff(request.project_dir, &doc)?;

    Ok(HandoffRecord {
        title,
        slug,
        path,
        file_name,
    })
}
