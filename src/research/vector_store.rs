//! Per-user vector storage for remembered sources.
//!
//! [`InMemoryVectorStore`] lives as long as the process;
//! [`JsonVectorStore`] keeps memories in a JSON file so they survive
//! restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::error::{Result, SiraError};
use crate::research::embedding::cosine_similarity;

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// Owner; searches only see their own vectors.
    pub user_id: String,
    /// Source URL, possibly empty.
    pub url: String,
    /// Source title, possibly empty.
    pub title: String,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    /// Cosine similarity to the query vector.
    pub score: f32,
    pub metadata: VectorMetadata,
}

/// Similarity index keyed by id.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the vector stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiraError::Pipeline`] if the backing store rejects
    /// the write.
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: VectorMetadata) -> Result<()>;

    /// Up to `top_k` vectors owned by `user_id`, most similar first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiraError::Pipeline`] if the backing store fails.
    async fn search(&self, vector: &[f32], top_k: usize, user_id: &str)
    -> Result<Vec<VectorMatch>>;
}

/// Brute-force cosine index held in memory.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<String, (Vec<f32>, VectorMetadata)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors across all users.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: VectorMetadata) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(id.to_owned(), (vector, metadata));
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        user_id: &str,
    ) -> Result<Vec<VectorMatch>> {
        let entries = self.entries.read().await;
        Ok(rank(
            entries.iter().map(|(id, (stored, meta))| (id.as_str(), stored.as_slice(), meta)),
            vector,
            top_k,
            user_id,
        ))
    }
}

/// One persisted memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVector {
    id: String,
    vector: Vec<f32>,
    metadata: VectorMetadata,
}

/// Brute-force cosine index persisted as a JSON array.
///
/// A missing, empty or corrupt file reads as an empty store. Writes go to a
/// temporary sibling file that is renamed over the target.
#[derive(Debug)]
pub struct JsonVectorStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonVectorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored vectors across all users.
    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn load(&self) -> Vec<StoredVector> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "memory store unreadable, treating as empty");
                return Vec::new();
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Vec::new();
        }
        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "memory store corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    async fn persist(&self, entries: &[StoredVector]) -> Result<()> {
        let json = serde_json::to_string(entries)
            .map_err(|e| SiraError::Pipeline(format!("cannot serialize memory store: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_name = format!(
            ".{}.tmp-{}",
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("memory"),
            std::process::id()
        );
        let tmp_path = self
            .path
            .parent()
            .map(|p| p.join(&tmp_name))
            .unwrap_or_else(|| PathBuf::from(&tmp_name));

        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for JsonVectorStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, metadata: VectorMetadata) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;
        let record = StoredVector {
            id: id.to_owned(),
            vector,
            metadata,
        };
        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = record,
            None => entries.push(record),
        }
        self.persist(&entries).await?;
        tracing::debug!(path = %self.path.display(), total = entries.len(), "memory store written");
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        user_id: &str,
    ) -> Result<Vec<VectorMatch>> {
        let entries = self.load().await;
        Ok(rank(
            entries
                .iter()
                .map(|e| (e.id.as_str(), e.vector.as_slice(), &e.metadata)),
            vector,
            top_k,
            user_id,
        ))
    }
}

/// Score `user_id`'s entries against `query`, best first, ties by id.
fn rank<'a>(
    entries: impl Iterator<Item = (&'a str, &'a [f32], &'a VectorMetadata)>,
    query: &[f32],
    top_k: usize,
    user_id: &str,
) -> Vec<VectorMatch> {
    let mut matches: Vec<VectorMatch> = entries
        .filter(|(_, _, meta)| meta.user_id == user_id)
        .map(|(id, stored, meta)| VectorMatch {
            id: id.to_owned(),
            score: cosine_similarity(query, stored),
            metadata: meta.clone(),
        })
        .collect();
    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.id.cmp(&b.id))
    });
    matches.truncate(top_k);
    matches
}
