//! In-memory cache of extracted pages keyed by URL.
//!
//! Live searches for related topics often land on the same pages; keeping
//! the extracted text for a short TTL avoids downloading them again. Built
//! on [`moka`] so lookups never block the runtime.

use std::time::Duration;

use moka::future::Cache;

use crate::types::PageContent;

/// Maximum number of extracted pages held in memory.
const MAX_PAGES: u64 = 256;

/// TTL-bounded page cache. A TTL of 0 disables caching entirely.
#[derive(Clone)]
pub struct PageCache {
    inner: Option<Cache<String, PageContent>>,
}

impl PageCache {
    /// Create a cache whose entries expire after `ttl_seconds`.
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = (ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_PAGES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    /// Cached page for `url`, if still fresh.
    pub async fn get(&self, url: &str) -> Option<PageContent> {
        match &self.inner {
            Some(cache) => cache.get(&normalise_key(url)).await,
            None => None,
        }
    }

    /// Remember an extracted page.
    pub async fn insert(&self, page: PageContent) {
        if let Some(cache) = &self.inner {
            cache.insert(normalise_key(&page.url), page).await;
        }
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

fn normalise_key(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageContent {
        PageContent {
            url: url.into(),
            title: "Cached".into(),
            text: "cached text".into(),
            word_count: 2,
        }
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = PageCache::new(600);
        assert!(cache.get("https://nowhere.example").await.is_none());
    }

    #[tokio::test]
    async fn insert_and_get() {
        let cache = PageCache::new(600);
        cache.insert(page("https://a.example/page")).await;
        let hit = cache.get("https://a.example/page").await.expect("should be cached");
        assert_eq!(hit.title, "Cached");
    }

    #[tokio::test]
    async fn trailing_slash_is_ignored() {
        let cache = PageCache::new(600);
        cache.insert(page("https://a.example/")).await;
        assert!(cache.get("https://a.example").await.is_some());
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cache = PageCache::new(0);
        cache.insert(page("https://a.example")).await;
        assert!(cache.get("https://a.example").await.is_none());
    }
}
