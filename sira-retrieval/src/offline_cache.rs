//! Durable offline cache of previously retrieved pages.
//!
//! The whole store is one pretty-printed JSON array of [`CacheEntry`]
//! records. Entries are appended per topic, never updated or removed, and
//! no two entries share a URL. The cache is the last resort when every
//! live provider fails, so loading never fails: a missing or corrupt file
//! reads as an empty store.
//!
//! Writers are serialised by an async mutex around the full
//! load → append → persist cycle, and persistence goes through a temp file
//! plus rename so readers never observe a half-written store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::{Result, RetrievalError};
use crate::types::{CacheEntry, SearchResult};

/// File-backed offline cache store.
#[derive(Debug)]
pub struct OfflineCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OfflineCache {
    /// Open a store backed by `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored entry in insertion order.
    ///
    /// A missing, unreadable or corrupt file yields an empty store; the
    /// problem is logged, never returned.
    pub async fn load(&self) -> Vec<CacheEntry> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "offline cache unreadable, treating as empty");
                return Vec::new();
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Vec::new();
        }
        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "offline cache corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Append results for `topic` whose URL is not yet stored anywhere in
    /// the cache, under any topic. Results without a URL are skipped.
    ///
    /// The file is rewritten only when at least one entry was added.
    /// Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Cache`] if the updated store cannot be
    /// written.
    pub async fn append_if_new(&self, topic: &str, results: &[SearchResult]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await;
        let mut known: HashSet<String> = entries.iter().map(|e| e.url.clone()).collect();

        let before = entries.len();
        for result in results {
            if result.url.is_empty() || !known.insert(result.url.clone()) {
                continue;
            }
            entries.push(CacheEntry {
                topic: topic.to_owned(),
                title: result.title.clone(),
                url: result.url.clone(),
                text: result.snippet.clone(),
            });
        }
        let added = entries.len() - before;

        if added == 0 {
            tracing::debug!("no new entries for offline cache");
            return Ok(0);
        }

        self.persist(&entries).await?;
        tracing::info!(added, total = entries.len(), "offline cache updated");
        Ok(added)
    }

    /// Entries whose stored topic contains `topic`, case-insensitively.
    pub async fn query_by_topic_substring(&self, topic: &str) -> Vec<CacheEntry> {
        let needle = topic.trim().to_lowercase();
        let matches: Vec<CacheEntry> = self
            .load()
            .await
            .into_iter()
            .filter(|e| e.topic.to_lowercase().contains(&needle))
            .collect();
        tracing::debug!(count = matches.len(), "offline cache query");
        matches
    }

    async fn persist(&self, entries: &[CacheEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| RetrievalError::Cache(format!("cannot serialize offline cache: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RetrievalError::Cache(format!("cannot create cache directory: {e}")))?;
        }

        let tmp_name = format!(
            ".{}.tmp-{}",
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("offline_cache"),
            std::process::id()
        );
        let tmp_path = self
            .path
            .parent()
            .map(|p| p.join(&tmp_name))
            .unwrap_or_else(|| PathBuf::from(&tmp_name));

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| RetrievalError::Cache(format!("cannot write offline cache: {e}")))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| RetrievalError::Cache(format!("cannot replace offline cache: {e}")))
    }
}
