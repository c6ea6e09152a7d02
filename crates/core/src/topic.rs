// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread topic derivation.
//!
//! A thread's initial topic is derived from the first prompt submitted
//! into it: whitespace-normalized, stripped of surrounding punctuation,
//! and capped at 100 code points.

/// Maximum topic length in code points.
const MAX_TOPIC_LEN: usize = 100;

/// Length a too-long topic is cut to before the ellipsis is appended.
const TRUNCATED_LEN: usize = 97;

/// Derive a thread topic from a prompt.
///
/// Collapses whitespace runs to single spaces, strips surrounding ASCII
/// punctuation, and truncates anything longer than 100 code points to 97
/// plus `"..."`. An all-whitespace prompt yields the empty string.
pub fn derive_topic(prompt: &str) -> String {
    let collapsed: String = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = collapsed
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .trim();

    if stripped.chars().count() <= MAX_TOPIC_LEN {
        return stripped.to_string();
    }

    let mut topic: String = stripped.chars().take(TRUNCATED_LEN).collect();
    topic.push_str("...");
    topic
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
