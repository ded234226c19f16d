//! Mention extraction.
//!
//! Scans normalized text for `@handle` tokens so the fanout stage can
//! notify the mentioned users.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `@` followed by one or more word characters.
static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("Invalid mention regex"));

/// Extract mentioned handles from content text (without the `@`).
///
/// Duplicates within one text are collapsed to a single entry, preserving
/// first-occurrence order so at most one notification per recipient is
/// produced.
pub fn extract_mentions(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    MENTION_REGEX
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .filter(|handle| seen.insert(handle.clone()))
        .collect()
}
