//! SIRA: research assistant backend.
//!
//! Topics flow through adaptive multi-provider retrieval
//! ([`sira_retrieval`]) and then through the research stages:
//! credibility scoring, summarisation, knowledge graph extraction and
//! per-user semantic memory.
//!
//! # Architecture
//!
//! - **Retrieval**: [`sira_retrieval::Retriever`] picks a provider, reroutes
//!   on failure and falls back to the offline cache
//! - **Credibility**: [`credibility::evaluate_source`] scores each source
//! - **Research**: [`research::ResearchPipeline`] summarises sources, builds
//!   a [`research::KnowledgeGraph`] and remembers texts per user
//! - **Config**: [`SiraConfig`] persisted as TOML under [`sira_dirs`]

pub mod config;
pub mod credibility;
pub mod error;
pub mod research;
pub mod sira_dirs;

pub use config::SiraConfig;
pub use error::{Result, SiraError};
pub use research::{ResearchPipeline, ResearchReport};
