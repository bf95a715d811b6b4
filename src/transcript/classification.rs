//! Message Classification
//!
//! Keyword heuristics deciding which transcript messages must survive
//! compaction (protected) and which are noise (low value).
//!
//! Matching is case-insensitive substring search with no tokenization, so
//! "ok" also matches inside "token". That over-matching is accepted.

use super::message::{Message, Role};

/// Messages shorter than this are checked for filler phrases
pub const FILLER_MAX_CHARS: usize = 40;
/// Messages shorter than this are checked for narration phrases
pub const META_MAX_CHARS: usize = 140;
/// Messages longer than this are checked for documentation structure
pub const DOC_DUMP_MIN_CHARS: usize = 400;

/// Decisions and summaries are always worth keeping
pub const DECISION_KEYWORDS: &[&str] = &[
    "decision",
    "decided",
    "we decided",
    "agreed",
    "summary",
    "next steps",
    "next step",
    "todo",
    "completed",
    "resolved",
    "conclusion",
    "root cause",
];

/// User phrases that carry a request
pub const INTENT_PHRASES: &[&str] = &[
    "need to",
    "want to",
    "can you",
    "could you",
    "please",
    "how do i",
    "how can i",
    "should we",
    "let's",
    "make sure",
];

/// Acknowledgements with no content
pub const FILLER_PHRASES: &[&str] = &[
    "got it",
    "sounds good",
    "ok",
    "okay",
    "thanks",
    "thank you",
    "sure",
    "great",
    "perfect",
    "i'll",
    "let me",
    "will do",
];

/// Agent narration of what it is about to do
pub const META_PHRASES: &[&str] = &[
    "let me check",
    "let me look",
    "let me read",
    "let me see",
    "i'll check",
    "i'll look",
    "running the",
    "loading the",
    "reading the",
    "checking the",
    "looking at the",
    "searching for",
];

/// Markdown structure markers counted by the documentation-dump heuristic
pub const DOC_STRUCTURE_MARKERS: &[&str] = &["\n## ", "\n### ", "\n- ", "\n* "];

/// Words that mark a pasted README or skill description
pub const DOC_OVERVIEW_KEYWORDS: &[&str] = &[
    "overview",
    "this skill",
    "this guide",
    "this document",
    "table of contents",
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn is_decision(lower: &str) -> bool {
    contains_any(lower, DECISION_KEYWORDS)
}

pub fn is_intent(lower: &str) -> bool {
    lower.contains('?') || contains_any(lower, INTENT_PHRASES)
}

pub fn is_filler(lower: &str, char_len: usize) -> bool {
    char_len < FILLER_MAX_CHARS && contains_any(lower, FILLER_PHRASES)
}

pub fn is_meta_narration(lower: &str, char_len: usize) -> bool {
    char_len < META_MAX_CHARS && contains_any(lower, META_PHRASES)
}

pub fn looks_like_doc_dump(lower: &str, char_len: usize) -> bool {
    if char_len <= DOC_DUMP_MIN_CHARS {
        return false;
    }
    let markers = DOC_STRUCTURE_MARKERS
        .iter()
        .filter(|m| lower.contains(*m))
        .count();
    if markers >= 2 {
        return true;
    }
    let has_heading = lower.starts_with('#') || lower.contains("\n#");
    has_heading && contains_any(lower, DOC_OVERVIEW_KEYWORDS)
}

/// A message tagged for compaction
#[derive(Debug, Clone)]
pub struct Annotated<'a> {
    /// Position in the original sequence
    pub index: usize,
    pub message: &'a Message,
    pub char_len: usize,
    /// Never evicted by budget-driven eviction
    pub protected: bool,
    /// Dropped before budget enforcement
    pub low_value: bool,
}

/// Index of the first user message, computed over the original sequence
pub fn first_user_index(messages: &[Message]) -> Option<usize> {
    messages.iter().position(|m| m.role == Role::User)
}

/// Classify every message independently.
pub fn annotate(messages: &[Message]) -> Vec<Annotated<'_>> {
    let first_user = first_user_index(messages);

    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            let lower = message.content.to_lowercase();
            let char_len = message.char_len();

            let protected = Some(index) == first_user
                || is_decision(&lower)
                || (message.role == Role::User && is_intent(&lower));

            let low_value = !protected
                && (is_filler(&lower, char_len)
                    || is_meta_narration(&lower, char_len)
                    || looks_like_doc_dump(&lower, char_len));

            Annotated {
                index,
                message,
                char_len,
                protected,
                low_value,
            }
        })
        .collect()
}
