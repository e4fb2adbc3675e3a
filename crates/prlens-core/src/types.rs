//! Domain types shared by the store, the embedders and the indexer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocumentId = String;
pub type Meta = HashMap<String, String>;

/// One embedded unit of content.
///
/// - `id`: `"<source>:<n>"`, where `n` is the store size at insertion time
/// - `content`: literal chunk text
/// - `source`: file path, or `pr:<ref>:<filename>` for diff chunks
/// - `embedding`: provider-sized vector; empty means "not embedded yet"
/// - `metadata`: informational key/values, never used for ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub content: String,
    pub source: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Meta,
}

impl Document {
    /// Identifier for the `seq`-th document inserted from `source`.
    pub fn make_id(source: &str, seq: usize) -> DocumentId {
        format!("{source}:{seq}")
    }

    pub fn is_embedded(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// A document paired with its similarity to a query. Higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

/// Which path produced an embedding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    Remote,
    Fallback,
}

/// A vector tagged with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub source: EmbeddingSource,
}

impl Embedding {
    pub fn remote(vector: Vec<f32>) -> Self {
        Self { vector, source: EmbeddingSource::Remote }
    }

    pub fn fallback(vector: Vec<f32>) -> Self {
        Self { vector, source: EmbeddingSource::Fallback }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == EmbeddingSource::Fallback
    }
}
