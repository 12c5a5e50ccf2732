//! Downstream research stages fed by retrieval.
//!
//! Sub-modules:
//! - `summarizer`: [`Summarizer`] and the lead-sentence fallback.
//! - `graph`: [`KnowledgeGraph`] and the heuristic entity/relation extractor.
//! - `embedding`: [`Embedder`] and the feature-hashing embedder.
//! - `vector_store`: [`VectorStore`] with in-memory and JSON-file indexes.
//! - `pipeline`: [`ResearchPipeline`] tying them to a retriever.

pub mod embedding;
pub mod graph;
pub mod pipeline;
pub mod summarizer;
pub mod vector_store;

pub use embedding::{Embedder, HashingEmbedder};
pub use graph::{GraphEdge, GraphExtractor, GraphNode, HeuristicGraphExtractor, KnowledgeGraph};
pub use pipeline::{ResearchPipeline, ResearchReport, SourceReport, memory_id};
pub use summarizer::{LeadSentenceSummarizer, Summarizer};
pub use vector_store::{
    InMemoryVectorStore, JsonVectorStore, VectorMatch, VectorMetadata, VectorStore,
};
