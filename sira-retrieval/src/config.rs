//! Retrieval configuration with sensible defaults.
//!
//! [`RetrievalConfig`] holds the static provider table, the retry shape of
//! both retrieval policies, HTTP timeouts and the offline cache location.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;
use crate::registry::{MAX_WEIGHT, MIN_WEIGHT};

/// Slack added on top of two request timeouts for a whole adapter fetch.
pub const FETCH_TIMEOUT_MARGIN_SECS: u64 = 10;

/// Upper bound for either end of `live_backoff_secs`.
pub const MAX_BACKOFF_SECS: u64 = 3600;

/// Which retry shape [`crate::Retriever::retrieve`] uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPolicy {
    /// Weighted provider selection with penalise-and-reroute on failure,
    /// bounded by `max_attempts`, then the offline cache.
    #[default]
    Adaptive,
    /// Live search up to `live_retries` times with randomized backoff,
    /// then the offline cache.
    LiveWithCacheFallback,
}

/// Static description of one search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name.
    pub name: String,
    /// Initial weight in `[0.1, 1.0]`.
    pub weight: f64,
    /// Remaining call budget; `None` means unlimited.
    #[serde(default)]
    pub quota: Option<u32>,
    /// Lower is preferred when weights tie.
    pub priority: u32,
}

impl ProviderConfig {
    /// Convenience constructor.
    pub fn new(name: &str, weight: f64, quota: Option<u32>, priority: u32) -> Self {
        Self {
            name: name.to_owned(),
            weight,
            quota,
            priority,
        }
    }
}

/// Configuration for a [`crate::Retriever`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Retry shape used by `retrieve`.
    pub policy: RetrievalPolicy,
    /// Known providers, in the order they are registered.
    pub providers: Vec<ProviderConfig>,
    /// Provider returned by the selector when nothing else is eligible.
    /// Must be registered and must not carry a quota.
    pub fallback_provider: String,
    /// Cap on adaptive attempts per call. `None` uses the provider count.
    pub max_attempts: Option<usize>,
    /// Delay before re-selecting after a generic provider failure.
    pub adaptive_retry_delay_ms: u64,
    /// Number of live search attempts for the live policy.
    pub live_retries: u32,
    /// Randomized backoff range in seconds `(min, max)` between live attempts.
    pub live_backoff_secs: (u64, u64),
    /// Search hits requested from the live search engine.
    pub max_results: usize,
    /// Extracted pages with this many words or fewer are discarded.
    pub min_words: usize,
    /// Per HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Bound on one whole adapter fetch (search plus page downloads) in
    /// seconds. `None` derives it from `timeout_seconds`.
    pub fetch_timeout_seconds: Option<u64>,
    /// Location of the offline cache JSON file. Relative paths resolve
    /// against the working directory.
    pub cache_path: PathBuf,
    /// TTL for extracted pages kept in memory. 0 disables the page cache.
    pub page_cache_ttl_seconds: u64,
    /// Custom User-Agent. If `None`, rotates through browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            policy: RetrievalPolicy::Adaptive,
            providers: vec![
                ProviderConfig::new("serpapi", 1.0, Some(100), 1),
                ProviderConfig::new("bing", 0.9, Some(1000), 2),
                ProviderConfig::new("tavily", 0.8, Some(500), 3),
                ProviderConfig::new("brave", 0.7, Some(2000), 4),
                ProviderConfig::new("duckduckgo", 0.5, None, 5),
            ],
            fallback_provider: "duckduckgo".into(),
            max_attempts: None,
            adaptive_retry_delay_ms: 500,
            live_retries: 3,
            live_backoff_secs: (5, 8),
            max_results: 3,
            min_words: 100,
            timeout_seconds: 20,
            fetch_timeout_seconds: None,
            cache_path: PathBuf::from("offline_cache.json"),
            page_cache_ttl_seconds: 600,
            user_agent: None,
        }
    }
}

impl RetrievalConfig {
    /// Number of adaptive attempts allowed per `retrieve` call.
    pub fn attempt_budget(&self) -> usize {
        self.max_attempts.unwrap_or(self.providers.len())
    }

    /// Bound on one whole adapter fetch: the explicit
    /// `fetch_timeout_seconds`, or two request timeouts plus
    /// [`FETCH_TIMEOUT_MARGIN_SECS`].
    pub fn fetch_timeout(&self) -> Duration {
        let secs = self.fetch_timeout_seconds.unwrap_or_else(|| {
            self.timeout_seconds
                .saturating_mul(2)
                .saturating_add(FETCH_TIMEOUT_MARGIN_SECS)
        });
        Duration::from_secs(secs)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.providers.is_empty() {
            return Err(RetrievalError::Config(
                "at least one provider must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.name.as_str()) {
                return Err(RetrievalError::Config(format!(
                    "duplicate provider name: {}",
                    provider.name
                )));
            }
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&provider.weight) {
                return Err(RetrievalError::Config(format!(
                    "weight for {} must be within [{MIN_WEIGHT}, {MAX_WEIGHT}]",
                    provider.name
                )));
            }
        }

        match self
            .providers
            .iter()
            .find(|p| p.name == self.fallback_provider)
        {
            None => {
                return Err(RetrievalError::Config(format!(
                    "fallback provider {} is not registered",
                    self.fallback_provider
                )));
            }
            Some(p) if p.quota.is_some() => {
                return Err(RetrievalError::Config(format!(
                    "fallback provider {} must not have a quota",
                    p.name
                )));
            }
            Some(_) => {}
        }

        if self.max_attempts == Some(0) {
            return Err(RetrievalError::Config(
                "max_attempts must be greater than 0".into(),
            ));
        }
        if self.live_retries == 0 {
            return Err(RetrievalError::Config(
                "live_retries must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(RetrievalError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(RetrievalError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.fetch_timeout_seconds == Some(0) {
            return Err(RetrievalError::Config(
                "fetch_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.live_backoff_secs.0 > self.live_backoff_secs.1 {
            return Err(RetrievalError::Config(
                "live_backoff_secs min must be <= max".into(),
            ));
        }
        if self.live_backoff_secs.1 > MAX_BACKOFF_SECS {
            return Err(RetrievalError::Config(format!(
                "live_backoff_secs max must be <= {MAX_BACKOFF_SECS}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = RetrievalConfig::default();
        assert_eq!(config.policy, RetrievalPolicy::Adaptive);
        assert_eq!(config.fallback_provider, "duckduckgo");
        assert_eq!(config.adaptive_retry_delay_ms, 500);
        assert_eq!(config.live_retries, 3);
        assert_eq!(config.live_backoff_secs, (5, 8));
        assert_eq!(config.max_results, 3);
        assert_eq!(config.min_words, 100);
        assert_eq!(config.timeout_seconds, 20);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn default_provider_table() {
        let config = RetrievalConfig::default();
        let names: Vec<&str> = config.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["serpapi", "bing", "tavily", "brave", "duckduckgo"]);
        let ddg = &config.providers[4];
        assert!(ddg.quota.is_none());
        assert!((ddg.weight - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn attempt_budget_defaults_to_provider_count() {
        let mut config = RetrievalConfig::default();
        assert_eq!(config.attempt_budget(), 5);
        config.max_attempts = Some(2);
        assert_eq!(config.attempt_budget(), 2);
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(RetrievalConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_providers_rejected() {
        let config = RetrievalConfig {
            providers: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider"));
    }

    #[test]
    fn duplicate_provider_rejected() {
        let mut config = RetrievalConfig::default();
        config.providers.push(ProviderConfig::new("bing", 0.5, None, 9));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn out_of_range_weight_rejected() {
        let mut config = RetrievalConfig::default();
        config.providers[0].weight = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("weight"));
    }

    #[test]
    fn unknown_fallback_rejected() {
        let config = RetrievalConfig {
            fallback_provider: "altavista".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn quota_limited_fallback_rejected() {
        let config = RetrievalConfig {
            fallback_provider: "bing".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn zero_retries_rejected() {
        let config = RetrievalConfig {
            live_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("live_retries"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = RetrievalConfig {
            max_attempts: Some(0),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("max_attempts"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = RetrievalConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn inverted_backoff_rejected() {
        let config = RetrievalConfig {
            live_backoff_secs: (8, 5),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("backoff"));
    }

    #[test]
    fn huge_backoff_rejected() {
        let config = RetrievalConfig {
            live_backoff_secs: (0, u64::MAX),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("backoff"));
    }

    #[test]
    fn fetch_timeout_outlasts_several_requests() {
        let config = RetrievalConfig::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(50));
        assert!(config.fetch_timeout() > Duration::from_secs(2 * config.timeout_seconds));

        let explicit = RetrievalConfig {
            fetch_timeout_seconds: Some(90),
            ..Default::default()
        };
        assert_eq!(explicit.fetch_timeout(), Duration::from_secs(90));

        let huge = RetrievalConfig {
            timeout_seconds: u64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.fetch_timeout(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn zero_fetch_timeout_rejected() {
        let config = RetrievalConfig {
            fetch_timeout_seconds: Some(0),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("fetch_timeout"));
    }

    #[test]
    fn policy_serialises_snake_case() {
        let json = serde_json::to_string(&RetrievalPolicy::LiveWithCacheFallback)
            .expect("serialize");
        assert_eq!(json, "\"live_with_cache_fallback\"");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RetrievalConfig =
            serde_json::from_str(r#"{"policy": "live_with_cache_fallback", "live_retries": 5}"#)
                .expect("deserialize");
        assert_eq!(config.policy, RetrievalPolicy::LiveWithCacheFallback);
        assert_eq!(config.live_retries, 5);
        assert_eq!(config.providers.len(), 5);
    }
}
