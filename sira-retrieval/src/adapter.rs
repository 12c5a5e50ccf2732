//! Trait definition for pluggable provider fetch adapters.
//!
//! Each search provider is reached through one [`FetchAdapter`]. Adapters
//! are held as trait objects by the orchestrator, keyed by provider name.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RawResult;

/// A fetch backend for one search provider.
///
/// An adapter either returns raw provider records or fails with:
///
/// - [`crate::RetrievalError::NotImplemented`] when the provider has no
///   integration. Unintegrated adapters must signal this deterministically
///   and never fabricate data.
/// - Any other [`crate::RetrievalError`] for transient failures (HTTP,
///   timeout, malformed payload).
///
/// An `Ok` with no records is legal; the orchestrator treats it as a
/// failure of the provider.
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    /// Name of the provider this adapter serves. Must match the registry.
    fn provider(&self) -> &str;

    /// Fetch raw records for `topic`.
    async fn fetch(&self, topic: &str) -> Result<Vec<RawResult>>;

    /// Whether the adapter writes its own results to the offline cache.
    ///
    /// When `false`, the orchestrator writes successful results through
    /// to the cache itself.
    fn persists_results(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use std::sync::Arc;

    struct MockAdapter {
        name: &'static str,
        records: Vec<RawResult>,
    }

    #[async_trait]
    impl FetchAdapter for MockAdapter {
        fn provider(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _topic: &str) -> Result<Vec<RawResult>> {
            if self.records.is_empty() {
                return Err(RetrievalError::Parse("mock adapter failure".into()));
            }
            Ok(self.records.clone())
        }
    }

    #[test]
    fn adapter_objects_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn FetchAdapter>();
    }

    #[tokio::test]
    async fn adapter_returns_records_through_trait_object() {
        let adapter: Arc<dyn FetchAdapter> = Arc::new(MockAdapter {
            name: "mock",
            records: vec![RawResult::new().with("title", "Hit")],
        });
        let records = adapter.fetch("anything").await.expect("should succeed");
        assert_eq!(records.len(), 1);
        assert_eq!(adapter.provider(), "mock");
        assert!(!adapter.persists_results());
    }

    #[tokio::test]
    async fn adapter_propagates_errors() {
        let adapter = MockAdapter {
            name: "mock",
            records: vec![],
        };
        let err = adapter.fetch("anything").await.unwrap_err();
        assert!(err.to_string().contains("mock adapter failure"));
    }
}
