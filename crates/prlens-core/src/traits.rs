use async_trait::async_trait;

use crate::types::Embedding;

/// Turns text into a fixed-length vector.
///
/// Implementations must not fail: a provider that talks to a remote service
/// is expected to degrade to a local scheme and report that through
/// [`Embedding::source`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `remote:nomic-embed-text|hash:d384`).
    fn embedder_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Embedding;
}
