//! Core types shared by adapters, the normaliser, the offline cache and
//! the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider name attached to results served from the offline cache.
pub const OFFLINE_CACHE_PROVIDER: &str = "offline_cache";

/// A canonical retrieval result, whatever provider produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title, `"Untitled"` when the provider gave none.
    pub title: String,
    /// Page URL. May be empty; dedup is keyed on `(url, title)`.
    pub url: String,
    /// The provider's snippet, or the full extracted body for providers
    /// that download pages.
    pub snippet: String,
    /// Name of the provider that produced this result.
    pub provider: String,
}

/// A provider payload record before normalisation.
///
/// Providers disagree on field names (`title` vs `name`, `url` vs `link`,
/// `snippet` vs `summary` vs `text`), so records are kept as loose JSON
/// objects until [`crate::normalize::normalize`] maps them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawResult(pub Map<String, Value>);

impl RawResult {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_owned(), Value::String(value.into()));
        self
    }

    /// First non-empty string value among `keys`, in order.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.0.get(*k).and_then(Value::as_str))
            .find(|v| !v.is_empty())
    }
}

/// Builds a record from a JSON object; non-object values yield an empty
/// record.
impl From<Value> for RawResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// A persisted offline cache record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The query topic that produced this entry.
    pub topic: String,
    /// Page title.
    pub title: String,
    /// Page URL, unique across the whole store.
    pub url: String,
    /// Full extracted page body.
    pub text: String,
}

impl CacheEntry {
    /// Present this entry as a result served from the offline cache.
    pub fn into_search_result(self) -> SearchResult {
        SearchResult {
            title: self.title,
            url: self.url,
            snippet: self.text,
            provider: OFFLINE_CACHE_PROVIDER.to_owned(),
        }
    }
}

/// Extracted readable content from a fetched web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// The URL that was fetched.
    pub url: String,
    /// The page title extracted from HTML.
    pub title: String,
    /// Cleaned, readable text with boilerplate stripped.
    pub text: String,
    /// Number of whitespace-separated words in `text`.
    pub word_count: usize,
}
