//! Wikilink token grammar.
//!
//! # Responsibility
//! - Scan note bodies for `[[Title]]` references.
//! - Own the single regex both extraction and rendering substitute against.
//!
//! # Invariants
//! - A token is `[[` followed by one or more characters excluding `[` and
//!   `]`, up to the first `]]`; nested brackets break the match.
//! - Extraction deduplicates by trimmed title in first-occurrence order.
//! - No error path: malformed bracket sequences are simply not matches.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashSet;

static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("valid wikilink regex"));

/// Returns the distinct trimmed titles referenced by `text`, in
/// first-occurrence order.
///
/// Tokens whose trimmed capture is empty are skipped; blank titles cannot
/// exist, so they could never resolve.
pub fn extract_wikilinks(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut titles = Vec::new();
    for caps in WIKILINK_RE.captures_iter(text) {
        let title = caps[1].trim();
        if title.is_empty() {
            continue;
        }
        if seen.insert(title.to_string()) {
            titles.push(title.to_string());
        }
    }
    titles
}

/// Rewrites every wikilink token in `text` through `replace`.
///
/// `replace` receives the trimmed title of each occurrence (tokens are
/// re-scanned individually, not deduplicated) and returns the replacement
/// text; `None` degrades the token to the trimmed title itself.
pub fn substitute_wikilinks<'t, F>(text: &'t str, mut replace: F) -> Cow<'t, str>
where
    F: FnMut(&str) -> Option<String>,
{
    WIKILINK_RE.replace_all(text, |caps: &Captures<'_>| {
        let title = caps[1].trim();
        replace(title).unwrap_or_else(|| title.to_string())
    })
}
