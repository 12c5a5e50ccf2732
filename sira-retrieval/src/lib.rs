//! # sira-retrieval
//!
//! Adaptive multi-provider retrieval for the SIRA research assistant.
//!
//! Decides which search provider answers a topic, degrades gracefully when
//! providers fail or run out of quota, persists successful live results into
//! a durable offline cache, and serves from that cache when no live provider
//! succeeds.
//!
//! ## Design
//!
//! - [`ProviderRegistry`] tracks a weight, an optional quota and a health
//!   flag per provider; successes reward, failures penalise
//! - [`selector::select`] picks the heaviest eligible provider, falling back
//!   to the designated always-available one
//! - [`FetchAdapter`] implementations fetch raw records; the live adapter
//!   scrapes DuckDuckGo and extracts page text, the others are placeholders
//! - [`normalize::normalize`] maps provider payloads onto [`SearchResult`]
//!   and deduplicates by `(url, title)`
//! - [`OfflineCache`] is a single JSON file with one entry per URL
//! - [`Retriever`] drives it all, one provider at a time, never failing:
//!   "no results" is an empty list

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod content;
pub mod error;
pub mod http;
pub mod normalize;
pub mod offline_cache;
pub mod orchestrator;
pub mod page_cache;
pub mod registry;
pub mod selector;
pub mod types;

pub use adapter::FetchAdapter;
pub use config::{ProviderConfig, RetrievalConfig, RetrievalPolicy};
pub use error::{Result, RetrievalError};
pub use offline_cache::OfflineCache;
pub use orchestrator::Retriever;
pub use registry::{Provider, ProviderRegistry};
pub use tokio_util::sync::CancellationToken;
pub use types::{CacheEntry, PageContent, RawResult, SearchResult};

/// Retrieve results for `topic` with a one-off [`Retriever`] built from
/// `config`.
///
/// Long-running services should build one [`Retriever`] and share it, so
/// provider state carries over between calls.
///
/// # Errors
///
/// Returns [`RetrievalError::Config`] if `config` is invalid. Retrieval
/// itself never fails; see [`Retriever::retrieve`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> sira_retrieval::Result<()> {
/// let config = sira_retrieval::RetrievalConfig::default();
/// let results = sira_retrieval::retrieve("quantum computing", config).await?;
/// for result in &results {
///     println!("{} ({}): {}", result.title, result.provider, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn retrieve(topic: &str, config: RetrievalConfig) -> Result<Vec<SearchResult>> {
    let retriever = Retriever::new(config)?;
    Ok(retriever.retrieve(topic).await)
}

/// Fetch and extract readable text content from a web page.
///
/// # Errors
///
/// Returns [`RetrievalError::Http`] or [`RetrievalError::Timeout`] if the
/// page cannot be fetched, or [`RetrievalError::Parse`] if it has no
/// extractable text.
pub async fn fetch_page_content(url: &str, config: &RetrievalConfig) -> Result<PageContent> {
    let client = http::build_client(config)?;
    let html = http::download_text(&client, url).await?;
    content::extract_content(&html, url)
}
