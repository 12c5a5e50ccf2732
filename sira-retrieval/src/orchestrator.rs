//! Retrieval orchestrator: provider selection, fetch, normalisation,
//! write-through and offline fallback.
//!
//! # Adaptive policy
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   SELECT ──► FETCH ─┬─ results ──► reward, consume quota,  │
//!                     │              normalise ──► RETURN    │
//!                     ├─ not implemented ──► penalize ───────┤ (no delay)
//!                     └─ error / empty ───► penalize, wait ──┘
//!   attempts exhausted ──► OFFLINE CACHE
//! ```
//!
//! # Live policy
//!
//! The fallback provider is tried up to `live_retries` times with a
//! randomized backoff between attempts, then the offline cache.
//!
//! Providers are always tried one at a time. The offline cache query is
//! total, so both policies always produce a (possibly empty) result list.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::adapter::FetchAdapter;
use crate::adapters::{LiveSearchAdapter, UnintegratedAdapter};
use crate::config::{RetrievalConfig, RetrievalPolicy};
use crate::error::{Result, RetrievalError};
use crate::normalize::{deduplicate, normalize};
use crate::offline_cache::OfflineCache;
use crate::registry::ProviderRegistry;
use crate::selector;
use crate::types::{CacheEntry, SearchResult};

/// Drives retrieval for a topic across providers and the offline cache.
///
/// Cheap to share behind an [`Arc`]; the registry and the cache are
/// process-wide state shared by every concurrent `retrieve` call.
pub struct Retriever {
    config: RetrievalConfig,
    registry: Arc<ProviderRegistry>,
    adapters: HashMap<String, Arc<dyn FetchAdapter>>,
    cache: Arc<OfflineCache>,
}

impl Retriever {
    /// Build a retriever with the stock adapters: the live DuckDuckGo
    /// adapter for the fallback provider and placeholders for the rest.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Config`] if the configuration is invalid.
    pub fn new(config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(OfflineCache::new(config.cache_path.clone()));
        let adapters: Vec<Arc<dyn FetchAdapter>> = config
            .providers
            .iter()
            .map(|p| -> Arc<dyn FetchAdapter> {
                if p.name == config.fallback_provider {
                    Arc::new(LiveSearchAdapter::new(&p.name, &config, Arc::clone(&cache)))
                } else {
                    Arc::new(UnintegratedAdapter::new(&p.name))
                }
            })
            .collect();
        Self::with_adapters(config, cache, adapters)
    }

    /// Build a retriever over caller-supplied adapters.
    ///
    /// Providers without an adapter behave as not implemented.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Config`] if the configuration is invalid.
    pub fn with_adapters(
        config: RetrievalConfig,
        cache: Arc<OfflineCache>,
        adapters: Vec<Arc<dyn FetchAdapter>>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(ProviderRegistry::new(&config.providers));
        let adapters = adapters
            .into_iter()
            .map(|a| (a.provider().to_owned(), a))
            .collect();
        Ok(Self {
            config,
            registry,
            adapters,
            cache,
        })
    }

    /// The provider registry shared by all calls.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// The offline cache store.
    pub fn cache(&self) -> &Arc<OfflineCache> {
        &self.cache
    }

    /// The active configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve results for `topic` using the configured policy.
    ///
    /// Never fails: when no provider succeeds and the offline cache has no
    /// match, the result is empty.
    pub async fn retrieve(&self, topic: &str) -> Vec<SearchResult> {
        match self.config.policy {
            RetrievalPolicy::Adaptive => self.retrieve_adaptive(topic).await,
            RetrievalPolicy::LiveWithCacheFallback => self.retrieve_live(topic).await,
        }
    }

    /// Like [`Retriever::retrieve`], but stops as soon as `cancel` fires,
    /// abandoning the in-flight fetch and any remaining retries.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Cancelled`] if cancelled before completion.
    pub async fn retrieve_cancellable(
        &self,
        topic: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("retrieval cancelled by caller");
                Err(RetrievalError::Cancelled)
            }
            results = self.retrieve(topic) => Ok(results),
        }
    }

    /// Weighted provider selection with penalise-and-reroute, bounded by
    /// the attempt budget, then the offline cache.
    pub async fn retrieve_adaptive(&self, topic: &str) -> Vec<SearchResult> {
        let budget = self.config.attempt_budget();
        let retry_delay = Duration::from_millis(self.config.adaptive_retry_delay_ms);

        for attempt in 1..=budget {
            let provider = selector::select(&self.registry, &self.config.fallback_provider);
            tracing::info!(provider = %provider, attempt, budget, "using provider");

            match self.attempt(&provider, topic).await {
                Ok(results) => return results,
                Err(RetrievalError::QuotaExhausted(_)) => {
                    tracing::debug!(provider = %provider, "quota exhausted, rerouting");
                }
                Err(e) if e.is_not_implemented() => {
                    tracing::warn!(provider = %provider, "provider not implemented, trying next");
                    self.registry.penalize(&provider);
                }
                Err(e) => {
                    tracing::warn!(provider = %provider, attempt, error = %e, "provider failed");
                    self.registry.penalize(&provider);
                    if attempt < budget && !retry_delay.is_zero() {
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        }

        tracing::warn!(budget, "all provider attempts failed");
        self.serve_from_cache(topic).await
    }

    /// Live search on the fallback provider with randomized backoff, then
    /// the offline cache. Leaves the registry untouched.
    pub async fn retrieve_live(&self, topic: &str) -> Vec<SearchResult> {
        let provider = self.config.fallback_provider.as_str();
        let retries = self.config.live_retries;

        for attempt in 1..=retries {
            match self.fetch_normalized(provider, topic).await {
                Ok(results) => {
                    tracing::info!(provider, count = results.len(), "live results retrieved");
                    return results;
                }
                Err(e) => {
                    tracing::warn!(provider, attempt, retries, error = %e, "live search failed");
                    if attempt < retries {
                        tokio::time::sleep(self.live_backoff()).await;
                    }
                }
            }
        }

        self.serve_from_cache(topic).await
    }

    /// One adaptive attempt against `provider`, applying registry effects
    /// on success.
    ///
    /// The quota unit is reserved before the fetch so concurrent calls
    /// cannot overspend it, and refunded if the fetch fails.
    async fn attempt(&self, provider: &str, topic: &str) -> Result<Vec<SearchResult>> {
        if !self.registry.reserve_quota(provider) {
            return Err(RetrievalError::QuotaExhausted(provider.to_owned()));
        }

        match self.fetch_normalized(provider, topic).await {
            Ok(results) => {
                self.registry.reward(provider);
                tracing::debug!(provider, count = results.len(), "provider succeeded");
                Ok(results)
            }
            Err(e) => {
                self.registry.refund_quota(provider);
                Err(e)
            }
        }
    }

    /// Fetch through the provider's adapter, normalise, and write through to
    /// the offline cache when the adapter does not persist on its own.
    ///
    /// Individual HTTP calls carry `timeout_seconds`; the whole adapter
    /// fetch (search plus page downloads) is bounded by the longer
    /// [`RetrievalConfig::fetch_timeout`].
    async fn fetch_normalized(&self, provider: &str, topic: &str) -> Result<Vec<SearchResult>> {
        let adapter = self
            .adapters
            .get(provider)
            .ok_or_else(|| RetrievalError::NotImplemented(provider.to_owned()))?;

        let timeout = self.config.fetch_timeout();
        let raw = tokio::time::timeout(timeout, adapter.fetch(topic))
            .await
            .map_err(|_| {
                RetrievalError::Timeout(format!("{provider} fetch exceeded {timeout:?}"))
            })??;

        if raw.is_empty() {
            return Err(RetrievalError::EmptyResult(provider.to_owned()));
        }

        let results = normalize(&raw, provider);
        if !adapter.persists_results() {
            self.write_through(topic, &results).await;
        }
        Ok(results)
    }

    async fn write_through(&self, topic: &str, results: &[SearchResult]) {
        let cacheable: Vec<SearchResult> = results
            .iter()
            .filter(|r| !r.url.is_empty() && !r.snippet.is_empty())
            .cloned()
            .collect();
        if cacheable.is_empty() {
            return;
        }
        if let Err(e) = self.cache.append_if_new(topic, &cacheable).await {
            tracing::warn!(error = %e, "offline cache write-through failed");
        }
    }

    async fn serve_from_cache(&self, topic: &str) -> Vec<SearchResult> {
        let results = deduplicate(
            self.cache
                .query_by_topic_substring(topic)
                .await
                .into_iter()
                .map(CacheEntry::into_search_result)
                .collect(),
        );
        if results.is_empty() {
            tracing::info!("no offline cache match");
        } else {
            tracing::info!(count = results.len(), "serving offline cache results");
        }
        results
    }

    fn live_backoff(&self) -> Duration {
        let (min, max) = self.config.live_backoff_secs;
        Duration::from_millis(rand::thread_rng().gen_range(backoff_millis(min, max)))
    }
}

/// Backoff window in milliseconds, saturating instead of overflowing.
fn backoff_millis(min_secs: u64, max_secs: u64) -> RangeInclusive<u64> {
    min_secs.saturating_mul(1000)..=max_secs.saturating_mul(1000)
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("Retriever")
            .field("policy", &self.config.policy)
            .field("adapters", &providers)
            .field("cache", &self.cache.path())
            .finish()
    }
}
