//! End-to-end research flow: retrieve, score, summarise, graph, remember.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use sira_retrieval::{Retriever, SearchResult};
use tracing::{debug, info};

use crate::credibility::evaluate_source;
use crate::error::Result;
use crate::research::embedding::{Embedder, HashingEmbedder};
use crate::research::graph::{GraphExtractor, HeuristicGraphExtractor, KnowledgeGraph};
use crate::research::summarizer::{LeadSentenceSummarizer, Summarizer};
use crate::research::vector_store::{
    InMemoryVectorStore, VectorMatch, VectorMetadata, VectorStore,
};

/// One retrieved source with its assessment.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub title: String,
    pub url: String,
    /// Provider that produced the result, or `offline_cache`.
    pub provider: String,
    /// Heuristic credibility in `[0.0, 1.0]`.
    pub credibility: f64,
    pub summary: String,
}

/// Everything [`ResearchPipeline::run`] learned about a topic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResearchReport {
    pub topic: String,
    pub sources: Vec<SourceReport>,
    pub graph: KnowledgeGraph,
}

impl ResearchReport {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Drives retrieval and the downstream stages for a topic.
///
/// Every stage sits behind a trait object; [`ResearchPipeline::new`] wires
/// the model-free defaults and the `with_*` methods swap stages out.
pub struct ResearchPipeline {
    retriever: Arc<Retriever>,
    summarizer: Arc<dyn Summarizer>,
    extractor: Arc<dyn GraphExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl std::fmt::Debug for ResearchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchPipeline")
            .field("retriever", &self.retriever)
            .finish_non_exhaustive()
    }
}

impl ResearchPipeline {
    /// Pipeline over `retriever` with the offline default stages.
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self {
            retriever,
            summarizer: Arc::new(LeadSentenceSummarizer),
            extractor: Arc::new(HeuristicGraphExtractor),
            embedder: Arc::new(HashingEmbedder::default()),
            store: Arc::new(InMemoryVectorStore::new()),
        }
    }

    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    #[must_use]
    pub fn with_graph_extractor(mut self, extractor: Arc<dyn GraphExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    #[must_use]
    pub fn with_vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = store;
        self
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Research `topic`: retrieve sources, score and summarise each, then
    /// extract a knowledge graph over the summaries.
    ///
    /// An empty retrieval produces an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiraError::Pipeline`] if a downstream stage fails.
    pub async fn run(&self, topic: &str) -> Result<ResearchReport> {
        let results = self.retriever.retrieve(topic).await;
        if results.is_empty() {
            info!("no sources found");
            return Ok(ResearchReport {
                topic: topic.to_owned(),
                ..Default::default()
            });
        }

        let mut sources = Vec::with_capacity(results.len());
        for result in results {
            sources.push(self.assess(result).await?);
        }

        let summaries: Vec<String> = sources.iter().map(|s| s.summary.clone()).collect();
        let graph = self.extractor.extract(&summaries).await?;
        info!(
            sources = sources.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "research complete"
        );

        Ok(ResearchReport {
            topic: topic.to_owned(),
            sources,
            graph,
        })
    }

    async fn assess(&self, result: SearchResult) -> Result<SourceReport> {
        let credibility = evaluate_source(&result.url, &result.snippet);
        let summary = self.summarizer.summarize(&result.snippet).await?;
        debug!(url = %result.url, credibility, "source assessed");
        Ok(SourceReport {
            title: result.title,
            url: result.url,
            provider: result.provider,
            credibility,
            summary,
        })
    }

    /// Embed `text` and store it for `user_id`. Returns the memory id,
    /// which is stable for the same user and text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiraError::Pipeline`] if embedding or storage fails.
    pub async fn remember(
        &self,
        user_id: &str,
        text: &str,
        url: &str,
        title: &str,
    ) -> Result<String> {
        let vector = self.embedder.embed(text).await?;
        let id = memory_id(user_id, text);
        self.store
            .upsert(
                &id,
                vector,
                VectorMetadata {
                    user_id: user_id.to_owned(),
                    url: url.to_owned(),
                    title: title.to_owned(),
                },
            )
            .await?;
        debug!(memory_id = %id, "memory stored");
        Ok(id)
    }

    /// Memories of `user_id` closest to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiraError::Pipeline`] if embedding or search fails.
    pub async fn recall(&self, user_id: &str, query: &str, top_k: usize) -> Result<Vec<VectorMatch>> {
        let vector = self.embedder.embed(query).await?;
        self.store.search(&vector, top_k, user_id).await
    }
}

/// Hex SHA-256 of `user_id` followed by `text`.
pub fn memory_id(user_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_id_is_stable_hex() {
        let a = memory_id("alice", "notes on fusion");
        let b = memory_id("alice", "notes on fusion");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn memory_id_depends_on_user_and_text() {
        assert_ne!(memory_id("alice", "x"), memory_id("bob", "x"));
        assert_ne!(memory_id("alice", "x"), memory_id("alice", "y"));
    }

    #[test]
    fn empty_report_is_empty() {
        assert!(ResearchReport::default().is_empty());
    }
}
