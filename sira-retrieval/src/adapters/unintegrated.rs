//! Placeholder adapter for providers whose API is not integrated yet.

use async_trait::async_trait;

use crate::adapter::FetchAdapter;
use crate::error::{Result, RetrievalError};
use crate::types::RawResult;

/// Adapter for a provider with no integration. Every fetch fails with
/// [`RetrievalError::NotImplemented`] so the orchestrator moves on
/// immediately.
#[derive(Debug, Clone)]
pub struct UnintegratedAdapter {
    name: String,
}

impl UnintegratedAdapter {
    /// Create a placeholder for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl FetchAdapter for UnintegratedAdapter {
    fn provider(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _topic: &str) -> Result<Vec<RawResult>> {
        Err(RetrievalError::NotImplemented(self.name.clone()))
    }
}
