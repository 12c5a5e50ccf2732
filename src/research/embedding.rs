//! Text embeddings for semantic recall.
//!
//! [`HashingEmbedder`] is a model-free stand-in: each lowercased word is
//! hashed into one of a fixed number of buckets and the bucket counts are
//! L2-normalised. Texts sharing vocabulary end up close under cosine
//! similarity.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{Result, SiraError};

/// Default embedding dimensions (matches common sentence-embedding models).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maps text to a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text`.
    ///
    /// # Errors
    ///
    /// Returns [`SiraError::Pipeline`] if the embedding backend fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Feature-hashing bag-of-words embedder.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dim: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl HashingEmbedder {
    /// Create an embedder producing `dim`-dimensional vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SiraError::Pipeline`] if `dim` is zero.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(SiraError::Pipeline(
                "embedding dimension must be greater than 0".into(),
            ));
        }
        Ok(Self { dim })
    }

    /// Output dimensions.
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dim as u64) as usize
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut counts = vec![0.0f32; self.dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            counts[self.bucket(&token.to_lowercase())] += 1.0;
        }
        l2_normalize(&counts)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

/// L2-normalise a vector. Zero vectors are returned unchanged.
pub fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < 1e-12 {
        return vec.to_vec();
    }
    vec.iter().map(|x| x / norm).collect()
}

/// Cosine similarity in `[-1.0, 1.0]`; 0.0 when either vector is zero or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom < 1e-12 {
        return 0.0;
    }
    dot / denom
}
