//! Transcript Module
//!
//! Conversation messages, the heuristics that classify them, and the
//! budget-driven compaction applied before summarization.

pub mod classification;
pub mod compaction;
pub mod jsonl;
pub mod message;

// Re-export public types for external use
pub use compaction::{compact, compact_with, CompactionStats, CompactorConfig};
pub use compaction::{CONVERSATION_CHAR_BUDGET, RECENT_PROTECT_COUNT};
pub use jsonl::{parse_transcript, read_transcript, Transcript};
pub use message::{Message, Role, Todo, TodoStatus, MAX_MESSAGE_CHARS, MAX_TRANSCRIPT_MESSAGES};
