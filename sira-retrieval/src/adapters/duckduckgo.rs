//! Live search adapter: DuckDuckGo search, page download, text extraction.
//!
//! Uses the HTML-only endpoint at `https://html.duckduckgo.com/html/`,
//! which needs no JavaScript and no API key. Each hit is downloaded and
//! reduced to its main text; pages that are too short are dropped. Every
//! successful fetch is written to the offline cache before returning.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use url::Url;

use crate::adapter::FetchAdapter;
use crate::config::RetrievalConfig;
use crate::content;
use crate::error::{Result, RetrievalError};
use crate::http;
use crate::normalize::UNTITLED;
use crate::offline_cache::OfflineCache;
use crate::page_cache::PageCache;
use crate::types::{PageContent, RawResult, SearchResult};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Pages downloaded at once for a single search.
const PAGE_CONCURRENCY: usize = 4;

/// A search engine hit before its page is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchHit {
    pub title: String,
    pub url: String,
}

/// The always-available live provider.
#[derive(Debug)]
pub struct LiveSearchAdapter {
    name: String,
    config: RetrievalConfig,
    cache: Arc<OfflineCache>,
    pages: PageCache,
}

impl LiveSearchAdapter {
    /// Create the adapter for provider `name`, persisting into `cache`.
    pub fn new(name: impl Into<String>, config: &RetrievalConfig, cache: Arc<OfflineCache>) -> Self {
        Self {
            name: name.into(),
            config: config.clone(),
            cache,
            pages: PageCache::new(config.page_cache_ttl_seconds),
        }
    }

    /// Search for `topic` and return the hits whose pages yielded enough
    /// text, in search order. The full page body is in `snippet`.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request itself fails. Individual page
    /// download failures only drop that page.
    pub async fn search_and_extract(&self, topic: &str) -> Result<Vec<SearchResult>> {
        let client = http::build_client(&self.config)?;
        let hits = self.search_hits(&client, topic).await?;
        tracing::debug!(provider = %self.name, hits = hits.len(), "search hits received");

        let client = &client;
        let pages: Vec<Option<(SearchHit, PageContent)>> = stream::iter(hits)
            .map(|hit| async move {
                let page = self.fetch_page(client, &hit.url).await?;
                Some((hit, page))
            })
            .buffered(PAGE_CONCURRENCY)
            .collect()
            .await;

        let min_words = self.config.min_words;
        let results: Vec<SearchResult> = pages
            .into_iter()
            .flatten()
            .filter(|(_, page)| content::is_substantial(page, min_words))
            .map(|(hit, page)| SearchResult {
                title: if hit.title.is_empty() { UNTITLED.to_owned() } else { hit.title },
                url: hit.url,
                snippet: page.text,
                provider: self.name.clone(),
            })
            .collect();

        tracing::debug!(provider = %self.name, kept = results.len(), "pages extracted");
        Ok(results)
    }

    async fn search_hits(&self, client: &reqwest::Client, topic: &str) -> Result<Vec<SearchHit>> {
        tracing::trace!(topic, "DuckDuckGo search");

        let response = client
            .post(SEARCH_ENDPOINT)
            .form(&[("q", topic)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| http::classify("DuckDuckGo request failed", e))?
            .error_for_status()
            .map_err(|e| RetrievalError::Http(format!("DuckDuckGo HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| http::classify("DuckDuckGo response read failed", e))?;

        parse_search_html(&html, self.config.max_results)
    }

    /// Download and extract one page. Failures are logged and yield `None`.
    async fn fetch_page(&self, client: &reqwest::Client, url: &str) -> Option<PageContent> {
        if let Some(page) = self.pages.get(url).await {
            return Some(page);
        }

        let html = match http::download_text(client, url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(url, error = %e, "page download failed");
                return None;
            }
        };

        match content::extract_content(&html, url) {
            Ok(page) => {
                self.pages.insert(page.clone()).await;
                Some(page)
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "page extraction failed");
                None
            }
        }
    }
}

#[async_trait]
impl FetchAdapter for LiveSearchAdapter {
    fn provider(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, topic: &str) -> Result<Vec<RawResult>> {
        let results = self.search_and_extract(topic).await?;
        if !results.is_empty() {
            tracing::info!(provider = %self.name, count = results.len(), "live results retrieved");
            if let Err(e) = self.cache.append_if_new(topic, &results).await {
                tracing::warn!(error = %e, "failed to persist live results");
            }
        }
        Ok(results
            .into_iter()
            .map(|r| {
                RawResult::new()
                    .with("title", r.title)
                    .with("url", r.url)
                    .with("text", r.snippet)
            })
            .collect())
    }

    fn persists_results(&self) -> bool {
        true
    }
}

/// Unwrap DuckDuckGo's redirect links.
///
/// DDG wraps URLs like `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`;
/// the `uddg` parameter carries the target.
fn extract_url(href: &str) -> Option<String> {
    let full_href = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&full_href).ok()?;

    if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
    } else {
        Some(full_href)
    }
}

/// Parse the DuckDuckGo HTML results page into hits, skipping ads.
pub(crate) fn parse_search_html(html: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )
    .map_err(|e| RetrievalError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse(".result__a")
        .map_err(|e| RetrievalError::Parse(format!("invalid title selector: {e:?}")))?;

    let mut hits: Vec<SearchHit> = Vec::new();

    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };
        let title = title_el
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if title.is_empty() {
            continue;
        }
        let Some(url) = title_el.value().attr("href").and_then(extract_url) else {
            continue;
        };
        if hits.iter().any(|h| h.url == url) {
            continue;
        }

        hits.push(SearchHit { title, url });
        if hits.len() >= max_results {
            break;
        }
    }

    Ok(hits)
}
