//! The document store: an ordered `Vec<Document>` plus the embedder that
//! fills it and the JSON file it persists to.
//!
//! Insertion order is persistence order and breaks score ties in `search`.
//! Mutating methods take `&mut self`; callers sharing a store across tasks
//! must wrap it themselves.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use prlens_core::{Document, Embedder, EmbeddingSource, Error, Meta, Result, SearchResult};

use crate::similarity::cosine_similarity;

pub struct DocumentStore {
    documents: Vec<Document>,
    embedder: Arc<dyn Embedder>,
    index_path: PathBuf,
}

impl DocumentStore {
    pub fn new(embedder: Arc<dyn Embedder>, index_path: impl Into<PathBuf>) -> Self {
        Self { documents: Vec::new(), embedder, index_path: index_path.into() }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn size(&self) -> usize {
        self.documents.len()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Embed `content` and append it. Duplicates are kept.
    ///
    /// Returns which embedding path produced the vector.
    pub async fn add(&mut self, content: &str, source: &str, metadata: Meta) -> EmbeddingSource {
        let id = Document::make_id(source, self.documents.len());
        let embedding = self.embedder.embed(content).await;
        debug!(
            id = %id,
            dim = embedding.vector.len(),
            source = ?embedding.source,
            "adding document"
        );
        self.documents.push(Document {
            id,
            content: content.to_string(),
            source: source.to_string(),
            embedding: embedding.vector,
            metadata,
        });
        embedding.source
    }

    /// Append a document that already carries its embedding.
    pub fn insert(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// Drop every document whose `source` starts with `prefix`; returns how many went.
    pub fn remove_by_source_prefix(&mut self, prefix: &str) -> usize {
        let before = self.documents.len();
        self.documents.retain(|d| !d.source.starts_with(prefix));
        before - self.documents.len()
    }

    /// Top `top_k` documents by cosine similarity to the embedded `query`.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        if self.documents.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let query = self.embedder.embed(query).await;
        self.search_by_vector(&query.vector, top_k)
    }

    /// Whether any stored document has an embedding of `dim` entries.
    pub fn has_dimension(&self, dim: usize) -> bool {
        self.documents.iter().any(|d| d.embedding.len() == dim)
    }

    /// Rank against an already computed query vector.
    ///
    /// Documents whose embedding length differs from the query score 0.0.
    pub fn search_by_vector(&self, query: &[f32], top_k: usize) -> Vec<SearchResult> {
        if !self.documents.is_empty() && !self.has_dimension(query.len()) {
            warn!(
                "query has {} dimensions but no stored embedding does; every score will be 0",
                query.len()
            );
        }
        let mut scored: Vec<(usize, f32)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, d)| (i, cosine_similarity(&d.embedding, query)))
            .collect();
        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| SearchResult { document: self.documents[i].clone(), score })
            .collect()
    }

    /// Empty the in-memory collection. The index file is left alone.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Write all embedded documents to the index file as a JSON array.
    ///
    /// Parent directories are created; the file is replaced atomically.
    pub fn save(&self) -> Result<()> {
        let parent = match self.index_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| Error::io(&parent, e))?;

        let skipped = self.documents.iter().filter(|d| !d.is_embedded()).count();
        if skipped > 0 {
            warn!("not persisting {skipped} document(s) without an embedding");
        }
        let persisted: Vec<&Document> = self.documents.iter().filter(|d| d.is_embedded()).collect();

        let tmp = NamedTempFile::new_in(&parent).map_err(|e| Error::io(&parent, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &persisted)?;
            writer.flush().map_err(|e| Error::io(tmp.path(), e))?;
        }
        tmp.persist(&self.index_path)
            .map_err(|e| Error::io(&self.index_path, e.error))?;
        info!("saved {} documents to {}", persisted.len(), self.index_path.display());
        Ok(())
    }

    /// Replace the in-memory collection with the index file's contents.
    ///
    /// Returns `false`, leaving the store untouched, when the file is missing
    /// or cannot be parsed.
    pub fn load(&mut self) -> bool {
        let raw = match fs::read_to_string(&self.index_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no index file at {}", self.index_path.display());
                return false;
            }
            Err(e) => {
                warn!("cannot read index {}: {e}", self.index_path.display());
                return false;
            }
        };
        match serde_json::from_str::<Vec<Document>>(&raw) {
            Ok(documents) => {
                info!("loaded {} documents from {}", documents.len(), self.index_path.display());
                self.documents = documents;
                true
            }
            Err(e) => {
                warn!("ignoring corrupt index {}: {e}", self.index_path.display());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prlens_core::Embedding;
    use std::collections::HashMap;

    /// Looks vectors up by exact text; unknown text embeds to an empty vector.
    struct TableEmbedder(HashMap<&'static str, Vec<f32>>);

    #[async_trait]
    impl Embedder for TableEmbedder {
        fn embedder_id(&self) -> &str {
            "table"
        }

        async fn embed(&self, text: &str) -> Embedding {
            Embedding::remote(self.0.get(text).cloned().unwrap_or_default())
        }
    }

    fn table_store(entries: &[(&'static str, Vec<f32>)]) -> DocumentStore {
        let embedder = TableEmbedder(entries.iter().cloned().collect());
        DocumentStore::new(Arc::new(embedder), "unused.json")
    }

    #[tokio::test]
    async fn example_scenario_ranks_and_truncates() {
        let mut store = table_store(&[
            ("doc one", vec![1.0, 0.0]),
            ("doc two", vec![0.0, 1.0]),
            ("doc three", vec![0.7, 0.7]),
            ("query", vec![1.0, 0.0]),
        ]);
        for content in ["doc one", "doc two", "doc three"] {
            store.add(content, "notes.md", Meta::new()).await;
        }

        let results = store.search("query", 2).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "doc one");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].document.content, "doc three");
        assert!((results[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
    }

    #[tokio::test]
    async fn ids_come_from_source_and_position() {
        let mut store = table_store(&[("a", vec![1.0]), ("b", vec![1.0])]);
        store.add("a", "x.md", Meta::new()).await;
        store.add("b", "y.md", Meta::new()).await;
        store.add("a", "x.md", Meta::new()).await;
        let ids: Vec<&str> = store.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["x.md:0", "y.md:1", "x.md:2"]);
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = table_store(&[("q", vec![1.0])]);
        assert!(store.search("q", 5).await.is_empty());
    }

    #[test]
    fn exact_ties_keep_insertion_order() {
        let mut store = table_store(&[]);
        let vectors = [vec![0.0, 1.0], vec![2.0, 0.0], vec![1.0, 0.0], vec![5.0, 0.0]];
        for (i, v) in vectors.into_iter().enumerate() {
            store.insert(Document {
                id: format!("d:{i}"),
                content: format!("c{i}"),
                source: "d".to_string(),
                embedding: v,
                metadata: Meta::new(),
            });
        }
        let ids: Vec<String> = store
            .search_by_vector(&[1.0, 0.0], 10)
            .into_iter()
            .map(|r| r.document.id)
            .collect();
        assert_eq!(ids, vec!["d:1", "d:2", "d:3", "d:0"]);
    }

    #[test]
    fn remove_by_source_prefix_only_drops_matches() {
        let mut store = table_store(&[]);
        for source in ["pr:7:a.rs", "docs/a.md", "pr:7:b.rs", "pr:70:c.rs"] {
            store.insert(Document {
                id: format!("{source}:0"),
                content: String::new(),
                source: source.to_string(),
                embedding: vec![1.0],
                metadata: Meta::new(),
            });
        }
        assert_eq!(store.remove_by_source_prefix("pr:7:"), 2);
        let left: Vec<&str> = store.documents().iter().map(|d| d.source.as_str()).collect();
        assert_eq!(left, vec!["docs/a.md", "pr:70:c.rs"]);
    }

    #[tokio::test]
    async fn mixed_dimensions_score_zero_against_the_other_path() {
        let mut store = table_store(&[
            ("remote doc", vec![1.0, 0.0, 0.0]),
            ("fallback doc", vec![1.0, 0.0]),
            ("wide query", vec![0.0, 0.0, 0.0, 1.0]),
            ("narrow query", vec![1.0, 0.0]),
        ]);
        store.add("remote doc", "r.md", Meta::new()).await;
        store.add("fallback doc", "f.md", Meta::new()).await;
        assert!(store.has_dimension(3));
        assert!(store.has_dimension(2));
        assert!(!store.has_dimension(4));

        let results = store.search("narrow query", 5).await;
        assert_eq!(results[0].document.content, "fallback doc");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].score, 0.0);

        let unmatched = store.search("wide query", 5).await;
        assert_eq!(unmatched.len(), 2);
        assert!(unmatched.iter().all(|r| r.score == 0.0));
        assert_eq!(unmatched[0].document.content, "remote doc");
    }
}
