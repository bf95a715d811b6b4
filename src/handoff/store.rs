use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Handoff not found: {0}")]
    NotFound(String),
    #[error("Invalid handoff name: {0}")]
    InvalidName(String),
    #[error("Invalid session ID")]
    InvalidSessionId,
}

/// Project-relative directory holding agent artifacts
pub const CLAUDE_DIR: &str = ".claude";
pub const HANDOFFS_DIR: &str = "handoffs";
pub const SESSION_SUMMARY_DIR: &str = "session-summary";
/// Handled handoffs, `name -> timestamp`
pub const HANDLED_FILE: &str = ".handled.json";
/// Infix identifying session summary files
pub const SUMMARY_MARKER: &str = "-summary-ID_";

/// Validate that a session ID contains only safe characters (alphanumeric, dash, underscore).
pub fn validate_session_id(session_id: &str) -> Result<(), StoreError> {
    if session_id.is_empty() {
        return Err(StoreError::InvalidSessionId);
    }
    if session_id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        Ok(())
    } else {
        Err(StoreError::InvalidSessionId)
    }
}

/// A handoff name must be a bare markdown file name
fn validate_handoff_name(name: &str) -> Result<(), StoreError> {
    let bare = !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name.ends_with(".md");
    if bare {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// Atomic write: write to a .tmp sibling then rename into place.
fn atomic_write(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn handoffs_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(CLAUDE_DIR).join(HANDOFFS_DIR)
}

pub fn session_summary_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(CLAUDE_DIR).join(SESSION_SUMMARY_DIR)
}

/// Content of a handoff document
#[derive(Debug, Clone)]
pub struct HandoffDocument<'a> {
    /// Heading text (title or slug)
    pub heading: &'a str,
    pub slug: &'a str,
    pub summary: &'a str,
    /// User note, never sent to the summarizer
    pub note: Option<&'a str>,
    pub created: DateTime<Local>,
}

impl HandoffDocument<'_> {
    pub fn file_name(&self) -> String {
        format!("{}-{}.md", self.slug, self.created.format("%Y-%m-%d-%H%M%S"))
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "# Handoff: {}\n\n**Created**: {}\n\n",
            self.heading,
            self.created.format("%Y-%m-%d %H:%M:%S")
        );
        if let Some(note) = self.note.filter(|n| !n.trim().is_empty()) {
            out.push_str(&format!("## User Note\n\n> {}\n\n", note.trim()));
        }
        out.push_str("---\n\n");
        out.push_str(self.summary);
        out.push_str("\n\n---\n\n");
        out.push_str(&format!(
            "**To resume**: Run `/pickup {}` in a new session\n",
            self.file_name()
        ));
        out
    }
}

/// Write a handoff document. Returns the path relative to the project root.
pub fn save_handoff(project_dir: &Path, doc: &HandoffDocument<'_>) -> Result<PathBuf, StoreError> {
    let dir = handoffs_dir(project_dir);
    fs::create_dir_all(&dir)?;

    let file_name = doc.file_name();
    atomic_write(&dir.join(&file_name), &doc.render())?;
    tracing::info!(file = %file_name, "Saved handoff");

    Ok(Path::new(CLAUDE_DIR).join(HANDOFFS_DIR).join(file_name))
}

/// Handoff file listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffEntry {
    pub name: String,
    pub path: String,
    pub modified: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled_at: Option<String>,
}

/// List handoffs, most recently modified first.
pub fn list_handoffs(project_dir: &Path) -> Result<Vec<HandoffEntry>, StoreError> {
    let dir = handoffs_dir(project_dir);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let handled = load_handled(project_dir);
    let mut entries = Vec::new();

    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Local>::from(t),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to stat handoff");
                continue;
            }
        };
        entries.push(HandoffEntry {
            path: format!("{}/{}/{}", CLAUDE_DIR, HANDOFFS_DIR, name),
            handled_at: handled.get(&name).cloned(),
            name,
            modified,
        });
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
    Ok(entries)
}

/// Handoffs not yet recorded in `.handled.json`, most recent first
pub fn pending_handoffs(project_dir: &Path) -> Result<Vec<HandoffEntry>, StoreError> {
    let mut entries = list_handoffs(project_dir)?;
    entries.retain(|e| e.handled_at.is_none());
    Ok(entries)
}

fn load_handled(project_dir: &Path) -> BTreeMap<String, String> {
    let path = handoffs_dir(project_dir).join(HANDLED_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return BTreeMap::new(),
    };
    match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Ignoring malformed handled metadata");
            BTreeMap::new()
        }
    }
}

/// Record that a handoff was picked up.
pub fn mark_handled(project_dir: &Path, name: &str) -> Result<(), StoreError> {
    validate_handoff_name(name)?;
    let dir = handoffs_dir(project_dir);
    if !dir.join(name).exists() {
        return Err(StoreError::NotFound(name.to_string()));
    }

    let mut handled = load_handled(project_dir);
    handled.insert(name.to_string(), Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
    atomic_write(&dir.join(HANDLED_FILE), &serde_json::to_string_pretty(&handled)?)?;
    Ok(())
}

/// Read a handoff document by file name
pub fn read_handoff(project_dir: &Path, name: &str) -> Result<String, StoreError> {
    validate_handoff_name(name)?;
    let path = handoffs_dir(project_dir).join(name);
    if !path.exists() {
        return Err(StoreError::NotFound(name.to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Summary file name: sortable UTC timestamp with `:` and `.` replaced by `-`
pub fn summary_file_name(session_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}{}{}.md",
        at.format("%Y-%m-%dT%H-%M-%S-%3fZ"),
        SUMMARY_MARKER,
        session_id
    )
}

/// Persist a compaction summary for the next session to pick up.
pub fn save_session_summary(project_dir: &Path, session_id: &str, summary: &str) -> Result<PathBuf, StoreError> {
    validate_session_id(session_id)?;
    let dir = session_summary_dir(project_dir);
    fs::create_dir_all(&dir)?;

    let path = dir.join(summary_file_name(session_id, Utc::now()));
    atomic_write(&path, summary)?;
    Ok(path)
}

/// Most recent session summary, trimmed. Any read failure or a blank file
/// means none.
pub fn latest_session_summary(project_dir: &Path) -> Option<String> {
    let dir = session_summary_dir(project_dir);
    let entries = fs::read_dir(&dir).ok()?;

    let newest = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".md") && name.contains(SUMMARY_MARKER))
        .max()?;

    match fs::read_to_string(dir.join(&newest)) {
        Ok(content) => Some(content.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => {
            tracing::warn!(file = %newest, error = %e, "Failed to read session summary");
            None
        }
    }
}
