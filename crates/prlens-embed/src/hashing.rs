//! Deterministic hashed bag-of-words embeddings.
//!
//! Used whenever the remote endpoint is unavailable, so indexing and search
//! keep working offline and tests are reproducible.

use async_trait::async_trait;
use std::hash::Hasher;
use twox_hash::XxHash64;

use prlens_core::{Embedder, Embedding, Error, Result};

pub const DEFAULT_DIM: usize = 384;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    id: String,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dim: DEFAULT_DIM, id: format!("hash:d{DEFAULT_DIM}") }
    }
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dim, id: format!("hash:d{dim}") })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// L2-normalized token counts; all zeros when `text` has no tokens.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokenize(text) {
            v[self.slot(&token)] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }

    fn slot(&self, token: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        // modulo in u64 first so 32-bit targets map the same way
        (hasher.finish() % self.dim as u64) as usize
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Embedding {
        Embedding::fallback(self.embed_text(text))
    }
}

/// Lowercase, drop everything but alphanumerics and whitespace, split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}
