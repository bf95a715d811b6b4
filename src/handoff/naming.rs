//! Handoff naming: titles and filename slugs.

use regex::Regex;

use crate::transcript::{Message, Role};

/// Slug used when nothing better can be derived
pub const FALLBACK_SLUG: &str = "handoff";
/// Maximum slug length in characters
pub const MAX_SLUG_CHARS: usize = 50;

const KEYWORD_MESSAGES: usize = 3;
const KEYWORD_COUNT: usize = 3;
const KEYWORD_PREFIX_CHARS: usize = 100;
const KEYWORD_MIN_CHARS: usize = 4;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "this", "that", "from", "have", "what", "when", "where", "which", "there", "their", "about",
    "into", "just", "also", "then", "than", "some", "could", "would", "should", "please",
];

lazy_static::lazy_static! {
    /// `Title: X`, `**Title:** X`, `## Title: X`, `Title - X` on its own line.
    /// A bare hyphen (`Title-case`) is not a separator.
    static ref TITLE_RE: Regex = Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:[*_]{1,2})?title(?:[*_]{1,2})?(?:[ \t]*:|[ \t]+-[ \t])[ \t]*(?:[*_]{1,2}[ \t]*)?(.+?)[ \t]*$"
    ).expect("title regex is valid");
    static ref MULTI_HYPHEN_RE: Regex = Regex::new(r"-{2,}").expect("hyphen regex is valid");
}

/// Extract a title line from free-form summary text.
pub fn extract_title(summary: &str) -> Option<String> {
    let caps = TITLE_RE.captures(summary)?;
    let raw = caps.get(1)?.as_str();
    let title = raw
        .trim_end_matches(|c| c == '*' || c == '_')
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Lowercase kebab-case slug, at most `MAX_SLUG_CHARS` long without a cut word.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-' || c.is_whitespace())
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    let mut slug = MULTI_HYPHEN_RE.replace_all(&joined, "-").trim_matches('-').to_string();

    // Only ASCII remains, so byte offsets are char offsets
    if slug.len() > MAX_SLUG_CHARS {
        let cut_mid_word = slug.as_bytes()[MAX_SLUG_CHARS] != b'-';
        let head = &slug[..MAX_SLUG_CHARS];
        let end = match head.rfind('-') {
            Some(pos) if cut_mid_word => pos,
            _ => MAX_SLUG_CHARS,
        };
        slug = slug[..end].trim_matches('-').to_string();
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Slug from the opening user messages when the summary has no title.
pub fn keyword_slug(messages: &[Message]) -> String {
    let combined = messages
        .iter()
        .filter(|m| m.role == Role::User)
        .take(KEYWORD_MESSAGES)
        .map(|m| m.content.chars().take(KEYWORD_PREFIX_CHARS).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let keywords: Vec<String> = combined
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|w| w.chars().count() >= KEYWORD_MIN_CHARS && !STOP_WORDS.contains(&w.as_str()))
        .take(KEYWORD_COUNT)
        .collect();

    if keywords.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        keywords.join("-")
    }
}

/// Title from the summary if present, slug derived from it or from the messages.
pub fn name_handoff(summary: &str, messages: &[Message]) -> (Option<String>, String) {
    match extract_title(summary) {
        Some(title) => {
            let slug = slugify(&title);
            (Some(title), slug)
        }
        None => (None, keyword_slug(messages)),
    }
}
