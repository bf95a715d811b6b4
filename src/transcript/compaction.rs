//! Transcript compaction
//!
//! Shrinks a conversation under a character budget before it is handed to the
//! summarizer:
//!
//! 1. drop low-value messages (filler, narration, documentation dumps)
//! 2. if the rest fits the budget, stop
//! 3. evict unprotected messages oldest-first, never touching the recent tail
//! 4. if still over budget, evict from the head unconditionally down to the tail
//!
//! The result is always a subsequence of the input in original order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classification::{annotate, Annotated};
use super::message::Message;

/// Character budget for the compacted conversation
pub const CONVERSATION_CHAR_BUDGET: usize = 8_000;
/// Number of most recent messages shielded from eviction
pub const RECENT_PROTECT_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompactorConfig {
    pub char_budget: usize,
    pub recent_protect_count: usize,
}

impl Default for CompactorConfig {
    fn default() -> Self {
        Self {
            char_budget: CONVERSATION_CHAR_BUDGET,
            recent_protect_count: RECENT_PROTECT_COUNT,
        }
    }
}

/// What compaction did, for logging and the CLI report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionStats {
    pub input_messages: usize,
    pub low_value_dropped: usize,
    pub evicted_unprotected: usize,
    pub evicted_forced: usize,
    pub output_chars: usize,
    pub over_budget: bool,
}

/// Compact with the default budget.
pub fn compact(messages: &[Message]) -> Vec<Message> {
    compact_with(messages, &CompactorConfig::default()).0
}

/// Compact a transcript under `config`. Pure and deterministic.
pub fn compact_with(messages: &[Message], config: &CompactorConfig) -> (Vec<Message>, CompactionStats) {
    let mut stats = CompactionStats {
        input_messages: messages.len(),
        ..Default::default()
    };

    let mut survivors: Vec<Annotated<'_>> = annotate(messages)
        .into_iter()
        .filter(|a| !a.low_value)
        .collect();
    stats.low_value_dropped = messages.len() - survivors.len();

    let budget = config.char_budget;
    let tail = config.recent_protect_count;
    let mut total: usize = survivors.iter().map(|a| a.char_len).sum();

    if total > budget {
        // Oldest-first, skipping protected. The tail boundary moves with every
        // eviction because it always refers to the current last `tail` entries.
        let mut i = 0;
        while total > budget && i < survivors.len().saturating_sub(tail) {
            if survivors[i].protected {
                i += 1;
            } else {
                total -= survivors.remove(i).char_len;
                stats.evicted_unprotected += 1;
            }
        }

        while total > budget && survivors.len() > tail {
            total -= survivors.remove(0).char_len;
            stats.evicted_forced += 1;
        }
    }

    survivors.sort_by_key(|a| a.index);
    stats.output_chars = total;
    stats.over_budget = total > budget;

    debug!(
        input = stats.input_messages,
        dropped = stats.low_value_dropped,
        evicted = stats.evicted_unprotected,
        forced = stats.evicted_forced,
        chars = stats.output_chars,
        "Compacted transcript"
    );

    let compacted = survivors.into_iter().map(|a| a.message.clone()).collect();
    (compacted, stats)
}
