//! Remote-first embedding with a guaranteed local fallback.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

use prlens_core::{Embedder, Embedding, Result, Settings};

use crate::hashing::HashingEmbedder;
use crate::remote::RemoteEmbedder;

/// Embeds through the remote endpoint when one is configured and reachable,
/// otherwise through [`HashingEmbedder`].
///
/// Remote vectors are cached per text (keyed by blake3 hash) for the lifetime
/// of the provider, so repeated chunks within one indexing run cost a single
/// request. Fallback vectors are cheap and never cached.
pub struct EmbeddingProvider {
    remote: Option<RemoteEmbedder>,
    fallback: HashingEmbedder,
    cache: Mutex<HashMap<String, Vec<f32>>>,
    warned: AtomicBool,
    id: String,
}

impl EmbeddingProvider {
    pub fn new(remote: Option<RemoteEmbedder>, fallback: HashingEmbedder) -> Self {
        let id = match &remote {
            Some(r) => format!("remote:{}|{}", r.model(), fallback.embedder_id()),
            None => fallback.embedder_id().to_string(),
        };
        Self {
            remote,
            fallback,
            cache: Mutex::new(HashMap::new()),
            warned: AtomicBool::new(false),
            id,
        }
    }

    /// Fallback-only provider with vectors of `dim` entries.
    pub fn offline(dim: usize) -> Result<Self> {
        Ok(Self::new(None, HashingEmbedder::new(dim)?))
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fallback = HashingEmbedder::new(settings.embedding.fallback_dim)?;
        let remote = match settings.embedding_endpoint() {
            Some(endpoint) => Some(RemoteEmbedder::new(
                endpoint,
                &settings.embedding.model,
                settings.embedding_timeout(),
            )?),
            None => None,
        };
        Ok(Self::new(remote, fallback))
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn fallback_dim(&self) -> usize {
        self.fallback.dim()
    }

    /// Number of remote vectors held in the per-run cache.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    async fn embed_remote(&self, remote: &RemoteEmbedder, text: &str) -> Option<Vec<f32>> {
        let key = blake3::hash(text.as_bytes()).to_hex().to_string();
        let cached = self.cache.lock().ok().and_then(|c| c.get(&key).cloned());
        if cached.is_some() {
            return cached;
        }
        match remote.embed(text).await {
            Ok(vector) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(key, vector.clone());
                }
                Some(vector)
            }
            Err(e) => {
                if self.warned.swap(true, Ordering::Relaxed) {
                    debug!("remote embedding failed, using hash fallback: {e}");
                } else {
                    warn!(
                        "remote embedding failed, using hash fallback from now on when needed: {e}"
                    );
                }
                None
            }
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingProvider {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Embedding {
        if let Some(remote) = &self.remote {
            if let Some(vector) = self.embed_remote(remote, text).await {
                return Embedding::remote(vector);
            }
        }
        Embedding::fallback(self.fallback.embed_text(text))
    }
}
