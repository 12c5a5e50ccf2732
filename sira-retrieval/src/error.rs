//! Error types for the sira-retrieval crate.
//!
//! Provider-level failures are recovered inside the orchestrator; only
//! configuration errors and caller-initiated cancellation ever reach the
//! caller. Messages never contain the search topic.

/// Errors that can occur while retrieving content for a topic.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The provider has no integration yet. Always recoverable by routing
    /// to the next provider, without delay.
    #[error("provider not implemented: {0}")]
    NotImplemented(String),

    /// An HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A fetch exceeded its time budget.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A provider response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider answered but yielded nothing usable.
    #[error("empty result from provider: {0}")]
    EmptyResult(String),

    /// The provider's remaining call budget is spent.
    #[error("quota exhausted for provider: {0}")]
    QuotaExhausted(String),

    /// The offline cache file could not be read or written.
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid retrieval configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The caller cancelled the retrieval.
    #[error("retrieval cancelled")]
    Cancelled,
}

impl RetrievalError {
    /// Whether this failure means the provider is simply not integrated.
    ///
    /// The adaptive policy retries these immediately; every other provider
    /// failure waits for the configured retry delay first.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }
}

/// Convenience type alias for sira-retrieval results.
pub type Result<T> = std::result::Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_implemented() {
        let err = RetrievalError::NotImplemented("serpapi".into());
        assert_eq!(err.to_string(), "provider not implemented: serpapi");
    }

    #[test]
    fn display_http() {
        let err = RetrievalError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_timeout() {
        let err = RetrievalError::Timeout("bing exceeded 20s".into());
        assert_eq!(err.to_string(), "timed out: bing exceeded 20s");
    }

    #[test]
    fn display_empty_result() {
        let err = RetrievalError::EmptyResult("tavily".into());
        assert_eq!(err.to_string(), "empty result from provider: tavily");
    }

    #[test]
    fn display_cancelled() {
        assert_eq!(RetrievalError::Cancelled.to_string(), "retrieval cancelled");
    }

    #[test]
    fn only_not_implemented_skips_delay() {
        assert!(RetrievalError::NotImplemented("brave".into()).is_not_implemented());
        assert!(!RetrievalError::Http("503".into()).is_not_implemented());
        assert!(!RetrievalError::EmptyResult("brave".into()).is_not_implemented());
        assert!(!RetrievalError::QuotaExhausted("brave".into()).is_not_implemented());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RetrievalError>();
    }
}
