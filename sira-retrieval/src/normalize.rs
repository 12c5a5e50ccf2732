//! Provider payload normalisation and result deduplication.
//!
//! Providers name the same fields differently. [`normalize`] maps each raw
//! record onto [`SearchResult`] and then drops repeats keyed on the
//! `(url, title)` pair, keeping the first occurrence.

use std::collections::HashSet;

use crate::types::{RawResult, SearchResult};

/// Title used when a record carries neither `title` nor `name`.
pub const UNTITLED: &str = "Untitled";

const TITLE_KEYS: &[&str] = &["title", "name"];
const URL_KEYS: &[&str] = &["url", "link"];
const SNIPPET_KEYS: &[&str] = &["snippet", "summary", "text"];

/// Map raw provider records onto canonical results and deduplicate them.
pub fn normalize(raw: &[RawResult], provider: &str) -> Vec<SearchResult> {
    let mapped = raw
        .iter()
        .map(|record| SearchResult {
            title: record.first_of(TITLE_KEYS).unwrap_or(UNTITLED).to_owned(),
            url: record.first_of(URL_KEYS).unwrap_or_default().to_owned(),
            snippet: record.first_of(SNIPPET_KEYS).unwrap_or_default().to_owned(),
            provider: provider.to_owned(),
        })
        .collect();
    deduplicate(mapped)
}

/// Drop results whose `(url, title)` pair was already seen, preserving
/// first-seen order.
pub fn deduplicate(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|r| seen.insert((r.url.clone(), r.title.clone())))
        .collect()
}
